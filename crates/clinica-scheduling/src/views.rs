//! On-demand reporting views.
//!
//! Both views are plain recomputations over committed state; nothing is
//! cached or materialized.

use std::sync::Arc;

use clinica_config::ClinicSettings;
use clinica_core::{
    AppointmentId, AppointmentStatus, AppointmentTypeId, DoctorId, EntityKind, PatientId,
    TimeSlot, round_down_to_step,
};
use clinica_storage::{ClinicStore, StorageError};
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::availability::AvailabilityCalculator;
use crate::error::BookingError;

/// One row of the today's-appointments view.
#[derive(Debug, Clone, Serialize)]
pub struct TodaysAppointment {
    pub appointment_id: AppointmentId,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub doctor_id: DoctorId,
    pub doctor_name: String,
    pub type_name: String,
    pub status: AppointmentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_end: OffsetDateTime,
}

/// All appointments whose scheduled date (UTC) is `now`'s date, joined with
/// patient/doctor/type display names, ordered by start ascending.
pub async fn todays_appointments(
    store: &dyn ClinicStore,
    now: OffsetDateTime,
) -> Result<Vec<TodaysAppointment>, StorageError> {
    let midnight = now.date().midnight().assume_utc();
    let day = TimeSlot {
        start: midnight,
        end: midnight + Duration::days(1),
    };

    let appointments = store.appointments_in_range(day).await?;
    let mut rows = Vec::with_capacity(appointments.len());
    for appointment in appointments {
        let patient = store
            .get_patient(appointment.patient_id)
            .await?
            .ok_or_else(|| {
                StorageError::reference_violation(
                    EntityKind::Patient.to_string(),
                    appointment.patient_id,
                )
            })?;
        let doctor = store
            .get_doctor(appointment.doctor_id)
            .await?
            .ok_or_else(|| {
                StorageError::reference_violation(
                    EntityKind::Doctor.to_string(),
                    appointment.doctor_id,
                )
            })?;
        let kind = store
            .get_appointment_type(appointment.type_id)
            .await?
            .ok_or_else(|| {
                StorageError::reference_violation(
                    EntityKind::AppointmentType.to_string(),
                    appointment.type_id,
                )
            })?;

        rows.push(TodaysAppointment {
            appointment_id: appointment.id,
            patient_id: patient.id,
            patient_name: patient.full_name(),
            doctor_id: doctor.id,
            doctor_name: doctor.full_name(),
            type_name: kind.name,
            status: appointment.status,
            scheduled_start: appointment.scheduled_start,
            scheduled_end: appointment.scheduled_end,
        });
    }
    Ok(rows)
}

/// One bookable slot in the available-slots view.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableSlot {
    pub doctor_id: DoctorId,
    pub doctor_name: String,
    pub type_id: AppointmentTypeId,
    pub type_name: String,
    pub slot: TimeSlot,
}

/// Free slots for every active doctor and every type in their capability
/// set, for the remainder of the current business day. The anchor is `now`
/// rounded down to the slot granularity; ordering is doctor, then type,
/// then start.
pub async fn available_slots(
    store: Arc<dyn ClinicStore>,
    settings: Arc<ClinicSettings>,
    now: OffsetDateTime,
) -> Result<Vec<AvailableSlot>, BookingError> {
    let granularity = settings.scheduling.slot_granularity_minutes;
    let (_, day_end) = settings
        .business_hours
        .resolve()
        .map_err(|e| BookingError::Configuration(e.to_string()))?;

    let anchor = round_down_to_step(now, granularity);
    let close = now.date().with_time(day_end).assume_utc();
    if anchor >= close {
        return Ok(Vec::new());
    }
    let range = TimeSlot {
        start: anchor,
        end: close,
    };

    let calculator = AvailabilityCalculator::new(store.clone(), settings);
    let mut rows = Vec::new();
    for doctor in store.list_doctors().await? {
        if !doctor.active {
            continue;
        }
        for type_id in store.doctor_capabilities(doctor.id).await? {
            let kind = match store.get_appointment_type(type_id).await? {
                Some(kind) => kind,
                None => continue,
            };
            let slots = calculator
                .free_slots(doctor.id, type_id, range, None)
                .await?;
            for slot in slots {
                rows.push(AvailableSlot {
                    doctor_id: doctor.id,
                    doctor_name: doctor.full_name(),
                    type_id,
                    type_name: kind.name.clone(),
                    slot,
                });
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinica_core::{
        Appointment, AppointmentType, Doctor, Gender, Patient, Staff,
    };
    use clinica_db_memory::InMemoryStore;
    use time::macros::{date, datetime};

    struct Fixture {
        store: Arc<InMemoryStore>,
        patient: Patient,
        doctor: Doctor,
        kind: AppointmentType,
        staff: Staff,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let patient = store
            .create_patient(
                Patient::new(
                    "Jane",
                    "Doe",
                    date!(1990 - 04 - 12),
                    Gender::Female,
                    "jane@example.com",
                )
                .unwrap(),
            )
            .await
            .unwrap();
        let doctor = store
            .create_doctor(
                Doctor::new("Amira", "Hassan", "Cardiology", "LIC-1", "amira@clinic.org")
                    .unwrap(),
            )
            .await
            .unwrap();
        let kind = store
            .create_appointment_type(AppointmentType::new("Checkup", 30, 5_000).unwrap())
            .await
            .unwrap();
        let staff = store
            .create_staff(Staff::new("Tom", "Riley", "Receptionist").unwrap())
            .await
            .unwrap();
        store.grant_capability(doctor.id, kind.id).await.unwrap();
        Fixture {
            store,
            patient,
            doctor,
            kind,
            staff,
        }
    }

    impl Fixture {
        async fn book_at(&self, start: OffsetDateTime) -> Appointment {
            let slot = TimeSlot::from_start(start, self.kind.duration_minutes).unwrap();
            self.store
                .insert_scheduled(Appointment::new(
                    self.patient.id,
                    self.doctor.id,
                    self.kind.id,
                    self.staff.id,
                    slot,
                ))
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_todays_appointments_filters_and_orders() {
        let f = fixture().await;
        f.book_at(datetime!(2026-03-02 11:00 UTC)).await;
        f.book_at(datetime!(2026-03-02 09:00 UTC)).await;
        // Different day, excluded
        f.book_at(datetime!(2026-03-03 09:00 UTC)).await;

        let rows = todays_appointments(f.store.as_ref(), datetime!(2026-03-02 12:00 UTC))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].scheduled_start, datetime!(2026-03-02 09:00 UTC));
        assert_eq!(rows[1].scheduled_start, datetime!(2026-03-02 11:00 UTC));
        assert_eq!(rows[0].patient_name, "Jane Doe");
        assert_eq!(rows[0].doctor_name, "Amira Hassan");
        assert_eq!(rows[0].type_name, "Checkup");
    }

    #[tokio::test]
    async fn test_todays_appointments_includes_all_statuses() {
        let f = fixture().await;
        let appt = f.book_at(datetime!(2026-03-02 09:00 UTC)).await;
        f.store
            .transition_status(
                appt.id,
                AppointmentStatus::Scheduled,
                AppointmentStatus::Cancelled,
            )
            .await
            .unwrap();

        let rows = todays_appointments(f.store.as_ref(), datetime!(2026-03-02 12:00 UTC))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_available_slots_exclude_booked() {
        let f = fixture().await;
        f.book_at(datetime!(2026-03-02 14:00 UTC)).await;

        let settings = Arc::new(ClinicSettings::default());
        let store: Arc<dyn ClinicStore> = f.store.clone();
        let rows = available_slots(store, settings, datetime!(2026-03-02 13:07 UTC))
            .await
            .unwrap();

        assert!(!rows.is_empty());
        // Anchored at 13:00, the first free slot is 13:00-13:30
        assert_eq!(rows[0].slot.start, datetime!(2026-03-02 13:00 UTC));
        let booked = TimeSlot::new(
            datetime!(2026-03-02 14:00 UTC),
            datetime!(2026-03-02 14:30 UTC),
        )
        .unwrap();
        for row in &rows {
            assert!(!row.slot.overlaps(&booked));
            assert_eq!(row.doctor_name, "Amira Hassan");
            assert_eq!(row.type_name, "Checkup");
        }
        // Last slot ends at the business-day close
        assert_eq!(rows.last().unwrap().slot.end, datetime!(2026-03-02 18:00 UTC));
    }

    #[tokio::test]
    async fn test_available_slots_skip_inactive_doctors() {
        let f = fixture().await;
        f.store.set_doctor_active(f.doctor.id, false).await.unwrap();

        let settings = Arc::new(ClinicSettings::default());
        let store: Arc<dyn ClinicStore> = f.store.clone();
        let rows = available_slots(store, settings, datetime!(2026-03-02 09:00 UTC))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_available_slots_after_hours_is_empty() {
        let f = fixture().await;
        let settings = Arc::new(ClinicSettings::default());
        let store: Arc<dyn ClinicStore> = f.store.clone();
        let rows = available_slots(store, settings, datetime!(2026-03-02 19:30 UTC))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
