//! The booking engine: validates a booking request and commits the
//! appointment atomically with respect to the overlap check.

use std::sync::Arc;

use clinica_core::{
    Appointment, AppointmentTypeId, DoctorId, EntityKind, PatientId, StaffId, TimeSlot,
};
use clinica_storage::{ClinicStore, StorageError};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::error::BookingError;

/// A request to book one patient with one doctor for one appointment type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub type_id: AppointmentTypeId,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_start: OffsetDateTime,
    pub created_by: StaffId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
}

/// Validates and commits bookings against the entity store.
///
/// Validation order: patient, staff, doctor resolve; doctor is active;
/// doctor is capable of the type; the requested interval is well-formed.
/// The final no-overlap check and the insert are one atomic unit inside
/// the store, so concurrent bookings cannot both commit the same slot.
#[derive(Clone)]
pub struct BookingEngine {
    store: Arc<dyn ClinicStore>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Books an appointment, returning it in `Scheduled` state.
    ///
    /// On failure nothing is committed; a `SlotConflict` is terminal and
    /// the caller may retry with a different time.
    pub async fn book(&self, request: BookingRequest) -> Result<Appointment, BookingError> {
        self.store
            .get_patient(request.patient_id)
            .await?
            .ok_or_else(|| {
                BookingError::invalid_reference(
                    EntityKind::Patient.to_string(),
                    request.patient_id,
                )
            })?;
        self.store
            .get_staff(request.created_by)
            .await?
            .ok_or_else(|| {
                BookingError::invalid_reference(EntityKind::Staff.to_string(), request.created_by)
            })?;

        let doctor = self
            .store
            .get_doctor(request.doctor_id)
            .await?
            .ok_or_else(|| {
                BookingError::invalid_reference(
                    EntityKind::Doctor.to_string(),
                    request.doctor_id,
                )
            })?;
        if !doctor.active {
            return Err(BookingError::DoctorInactive(request.doctor_id));
        }

        let kind = self
            .store
            .get_appointment_type(request.type_id)
            .await?
            .ok_or_else(|| {
                BookingError::invalid_reference(
                    EntityKind::AppointmentType.to_string(),
                    request.type_id,
                )
            })?;
        if !self
            .store
            .has_capability(request.doctor_id, request.type_id)
            .await?
        {
            return Err(BookingError::CapabilityMismatch {
                doctor_id: request.doctor_id,
                type_id: request.type_id,
            });
        }

        // End = start + duration, so the ordering holds by construction;
        // re-checked here all the same before anything is committed.
        let slot = TimeSlot::from_start(request.requested_start, kind.duration_minutes)?;

        let mut appointment = Appointment::new(
            request.patient_id,
            request.doctor_id,
            request.type_id,
            request.created_by,
            slot,
        );
        if let Some(notes) = request.notes {
            appointment = appointment.with_notes(notes);
        }

        match self.store.insert_scheduled(appointment).await {
            Ok(committed) => {
                info!(
                    appointment_id = %committed.id,
                    doctor_id = %committed.doctor_id,
                    patient_id = %committed.patient_id,
                    slot = %committed.slot(),
                    "appointment booked"
                );
                Ok(committed)
            }
            Err(StorageError::SlotConflict { .. }) => {
                warn!(
                    doctor_id = %request.doctor_id,
                    slot = %slot,
                    "booking rejected: slot conflict"
                );
                Err(BookingError::SlotConflict {
                    doctor_id: request.doctor_id,
                    slot,
                })
            }
            Err(other) => Err(other.into()),
        }
    }
}
