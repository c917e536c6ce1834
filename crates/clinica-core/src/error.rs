use thiserror::Error;

/// Core error types for Clinica domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid time range: end {end} is not after start {start}")]
    InvalidTimeRange { start: String, end: String },

    #[error("Invalid date range: due date {due} is before issue date {issue}")]
    InvalidDateRange { issue: String, due: String },

    #[error("Invalid quantity {0}: must be greater than zero")]
    InvalidQuantity(u32),

    #[error("Invalid duration {0} minutes: must be greater than zero")]
    InvalidDuration(u32),

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Entity not found: {entity_type}/{id}")]
    EntityNotFound { entity_type: String, id: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time parsing error: {0}")]
    TimeError(#[from] time::error::Parse),

    #[error("UUID error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Create a new InvalidEmail error
    pub fn invalid_email(email: impl Into<String>) -> Self {
        Self::InvalidEmail(email.into())
    }

    /// Create a new InvalidTimeRange error
    pub fn invalid_time_range(start: impl ToString, end: impl ToString) -> Self {
        Self::InvalidTimeRange {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Create a new InvalidDateRange error
    pub fn invalid_date_range(issue: impl ToString, due: impl ToString) -> Self {
        Self::InvalidDateRange {
            issue: issue.to_string(),
            due: due.to_string(),
        }
    }

    /// Create a new InvalidField error
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new EntityNotFound error
    pub fn entity_not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this error is a client error (caller supplied bad data)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail(_)
                | Self::InvalidTimeRange { .. }
                | Self::InvalidDateRange { .. }
                | Self::InvalidQuantity(_)
                | Self::InvalidDuration(_)
                | Self::InvalidField { .. }
                | Self::EntityNotFound { .. }
                | Self::JsonError(_)
        )
    }

    /// Check if this error is a server-side error
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::TimeError(_) | Self::UuidError(_)
        )
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidEmail(_)
            | Self::InvalidTimeRange { .. }
            | Self::InvalidDateRange { .. }
            | Self::InvalidQuantity(_)
            | Self::InvalidDuration(_)
            | Self::InvalidField { .. } => ErrorCategory::Validation,
            Self::EntityNotFound { .. } => ErrorCategory::NotFound,
            Self::JsonError(_) => ErrorCategory::Serialization,
            Self::TimeError(_) | Self::UuidError(_) => ErrorCategory::System,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Serialization,
    System,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Serialization => write!(f, "serialization"),
            Self::System => write!(f, "system"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
