//! Storage error types for the clinic entity store.
//!
//! Constraint violations detected at commit time (uniqueness, references,
//! the no-overlap rule, status state) each map to a dedicated variant so
//! callers can translate them into typed domain errors instead of losing
//! them in a catch-all.

use std::fmt;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested entity was not found.
    #[error("Entity not found: {entity_type}/{id}")]
    NotFound {
        /// The kind of entity that was not found.
        entity_type: String,
        /// The ID of the entity that was not found.
        id: String,
    },

    /// Attempted to create an entity that already exists, or to reuse a
    /// unique field (email, license number, department or type name).
    #[error("Already exists: {entity_type} with {field} = {value}")]
    AlreadyExists {
        /// The kind of entity involved.
        entity_type: String,
        /// The unique field that collided.
        field: String,
        /// The colliding value.
        value: String,
    },

    /// A foreign reference did not resolve at commit time.
    #[error("Reference violation: {entity_type}/{id} does not resolve")]
    ReferenceViolation {
        /// The kind of entity the reference points at.
        entity_type: String,
        /// The unresolved ID.
        id: String,
    },

    /// The requested interval overlaps a scheduled appointment for the doctor.
    #[error("Slot conflict: doctor {doctor_id} already booked in [{start} .. {end})")]
    SlotConflict {
        /// The doctor whose schedule conflicted.
        doctor_id: String,
        /// Requested interval start (RFC 3339).
        start: String,
        /// Requested interval end (RFC 3339).
        end: String,
    },

    /// A compare-and-swap on appointment status found a different current state.
    #[error("State conflict: appointment {id} is {actual}, expected {expected}")]
    StateConflict {
        /// The appointment whose status was contested.
        id: String,
        /// The status the caller expected.
        expected: String,
        /// The status actually found.
        actual: String,
    },

    /// The entity data is invalid.
    #[error("Invalid entity: {message}")]
    InvalidEntity {
        /// Description of why the entity is invalid.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(
        entity_type: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::AlreadyExists {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a new `ReferenceViolation` error.
    #[must_use]
    pub fn reference_violation(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::ReferenceViolation {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a new `SlotConflict` error.
    #[must_use]
    pub fn slot_conflict(
        doctor_id: impl ToString,
        start: impl ToString,
        end: impl ToString,
    ) -> Self {
        Self::SlotConflict {
            doctor_id: doctor_id.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Creates a new `StateConflict` error.
    #[must_use]
    pub fn state_conflict(
        id: impl ToString,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::StateConflict {
            id: id.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates a new `InvalidEntity` error.
    #[must_use]
    pub fn invalid_entity(message: impl Into<String>) -> Self {
        Self::InvalidEntity {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a slot conflict.
    #[must_use]
    pub fn is_slot_conflict(&self) -> bool {
        matches!(self, Self::SlotConflict { .. })
    }

    /// Returns `true` if this is a conflict of any kind.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists { .. } | Self::SlotConflict { .. } | Self::StateConflict { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::AlreadyExists { .. } | Self::SlotConflict { .. } | Self::StateConflict { .. } => {
                ErrorCategory::Conflict
            }
            Self::ReferenceViolation { .. } => ErrorCategory::Reference,
            Self::InvalidEntity { .. } => ErrorCategory::Validation,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Entity not found.
    NotFound,
    /// Conflict (existence, slot, or state).
    Conflict,
    /// Foreign reference did not resolve.
    Reference,
    /// Validation error.
    Validation,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Reference => write!(f, "reference"),
            Self::Validation => write!(f, "validation"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
