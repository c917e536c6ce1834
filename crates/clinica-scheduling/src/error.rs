use clinica_core::{
    AppointmentId, AppointmentStatus, AppointmentTypeId, CoreError, DoctorId, TimeSlot,
};
use clinica_storage::StorageError;
use thiserror::Error;

/// Errors produced while computing availability or committing a booking.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Doctor {0} is inactive")]
    DoctorInactive(DoctorId),

    #[error("Doctor {doctor_id} cannot perform appointment type {type_id}")]
    CapabilityMismatch {
        doctor_id: DoctorId,
        type_id: AppointmentTypeId,
    },

    #[error("Slot conflict for doctor {doctor_id}: {slot}")]
    SlotConflict { doctor_id: DoctorId, slot: TimeSlot },

    #[error("Reference does not resolve: {entity_type}/{id}")]
    InvalidReference { entity_type: String, id: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl BookingError {
    pub fn invalid_reference(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::InvalidReference {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Whether the caller can fix this by changing the request
    /// (as opposed to an infrastructure fault).
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Configuration(_) => false,
            Self::Storage(e) => e.category() != clinica_storage::ErrorCategory::Internal,
            _ => true,
        }
    }
}

impl From<StorageError> for BookingError {
    fn from(err: StorageError) -> Self {
        match err {
            // Commit-time reference failures surface as their typed form.
            // Slot conflicts are mapped at the call site, where the typed
            // doctor ID and requested interval are still in hand.
            StorageError::ReferenceViolation { entity_type, id } => {
                Self::InvalidReference { entity_type, id }
            }
            other => Self::Storage(other),
        }
    }
}

/// Errors produced by appointment lifecycle transitions.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error(
        "Late cancellation of appointment {appointment_id}: requires {notice_hours}h notice before the scheduled start"
    )]
    LatePolicyViolation {
        appointment_id: AppointmentId,
        notice_hours: u32,
    },

    #[error("Appointment not found: {0}")]
    NotFound(AppointmentId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LifecycleError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}
