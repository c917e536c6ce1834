//! Maps domain errors onto HTTP responses.
//!
//! Every typed error from the lower layers is translated to a status code
//! and a `{"error": {"code", "message"}}` body; nothing is silently dropped.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use clinica_core::CoreError;
use clinica_scheduling::{BookingError, LifecycleError};
use clinica_storage::{ErrorCategory as StorageCategory, StorageError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn unprocessable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }
        let body = json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if err.is_client_error() {
            Self::unprocessable("validation", err.to_string())
        } else {
            Self::internal(err.to_string())
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        let message = err.to_string();
        match err.category() {
            StorageCategory::NotFound => Self::not_found(message),
            StorageCategory::Conflict => Self::conflict("conflict", message),
            StorageCategory::Reference => Self::unprocessable("invalid_reference", message),
            StorageCategory::Validation => Self::unprocessable("validation", message),
            StorageCategory::Internal => Self::internal(message),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::DoctorInactive(_) => Self::conflict("doctor_inactive", message),
            BookingError::CapabilityMismatch { .. } => {
                Self::conflict("capability_mismatch", message)
            }
            BookingError::SlotConflict { .. } => Self::conflict("slot_conflict", message),
            BookingError::InvalidReference { .. } => {
                Self::unprocessable("invalid_reference", message)
            }
            BookingError::Validation(_) => Self::unprocessable("validation", message),
            BookingError::Configuration(_) => Self::internal(message),
            BookingError::Storage(storage) => storage.into(),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        let message = err.to_string();
        match err {
            LifecycleError::InvalidTransition { .. } => {
                Self::conflict("invalid_transition", message)
            }
            LifecycleError::LatePolicyViolation { .. } => {
                Self::conflict("late_cancellation", message)
            }
            LifecycleError::NotFound(_) => Self::not_found(message),
            LifecycleError::Storage(storage) => storage.into(),
        }
    }
}
