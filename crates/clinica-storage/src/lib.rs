//! Storage abstraction for the Clinica entity store.
//!
//! Defines the [`ClinicStore`] trait that every backend implements, and the
//! [`StorageError`] taxonomy surfaced to callers. The booking engine and
//! lifecycle manager operate only through this trait.

pub mod error;
pub mod traits;

pub use error::{ErrorCategory, StorageError};
pub use traits::ClinicStore;
