//! Appointment lifecycle transitions.
//!
//! `Scheduled` is the only non-terminal state; the legal transitions are
//! `Scheduled -> {Completed, Cancelled, NoShow}`. Cancellations are checked
//! against the clinic's notice policy, which either blocks or merely flags
//! late requests depending on configuration.

use std::sync::Arc;

use clinica_config::{CancellationEnforcement, CancellationPolicy};
use clinica_core::{Appointment, AppointmentId, AppointmentStatus};
use clinica_storage::{ClinicStore, StorageError};
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::error::LifecycleError;

/// Applies lifecycle transitions under the clinic's cancellation policy.
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn ClinicStore>,
    policy: CancellationPolicy,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn ClinicStore>, policy: CancellationPolicy) -> Self {
        Self { store, policy }
    }

    /// Transitions an appointment to `new_status`, evaluated at `now`.
    ///
    /// Fails with `InvalidTransition` when the current status is terminal
    /// (or the target is `Scheduled`), and with `LatePolicyViolation` when
    /// a blocking policy rejects a late cancellation. The underlying status
    /// write is a compare-and-swap, so a concurrent transition that got
    /// there first surfaces as `InvalidTransition` as well.
    pub async fn transition(
        &self,
        id: AppointmentId,
        new_status: AppointmentStatus,
        now: OffsetDateTime,
    ) -> Result<Appointment, LifecycleError> {
        let appointment = self
            .store
            .get_appointment(id)
            .await?
            .ok_or(LifecycleError::NotFound(id))?;

        if !appointment.status.can_transition_to(new_status) {
            return Err(LifecycleError::InvalidTransition {
                from: appointment.status,
                to: new_status,
            });
        }

        if new_status == AppointmentStatus::Cancelled {
            self.check_cancellation_notice(&appointment, now)?;
        }

        match self
            .store
            .transition_status(id, AppointmentStatus::Scheduled, new_status)
            .await
        {
            Ok(updated) => {
                info!(
                    appointment_id = %id,
                    from = %appointment.status,
                    to = %new_status,
                    "appointment transitioned"
                );
                Ok(updated)
            }
            // Lost the race: someone else moved it to a terminal state.
            Err(StorageError::StateConflict { .. }) => {
                let current = self
                    .store
                    .get_appointment(id)
                    .await?
                    .ok_or(LifecycleError::NotFound(id))?;
                Err(LifecycleError::InvalidTransition {
                    from: current.status,
                    to: new_status,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Enforces the cancellation notice window.
    ///
    /// A cancellation must happen no later than `notice_hours` before the
    /// scheduled start. Under `Advise` enforcement a violation is logged
    /// and the transition proceeds.
    fn check_cancellation_notice(
        &self,
        appointment: &Appointment,
        now: OffsetDateTime,
    ) -> Result<(), LifecycleError> {
        let deadline =
            appointment.scheduled_start - Duration::hours(i64::from(self.policy.notice_hours));
        if now <= deadline {
            return Ok(());
        }
        match self.policy.enforcement {
            CancellationEnforcement::Block => Err(LifecycleError::LatePolicyViolation {
                appointment_id: appointment.id,
                notice_hours: self.policy.notice_hours,
            }),
            CancellationEnforcement::Advise => {
                warn!(
                    appointment_id = %appointment.id,
                    notice_hours = self.policy.notice_hours,
                    scheduled_start = %appointment.scheduled_start,
                    "late cancellation accepted under advisory policy"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinica_core::{
        AppointmentType, Doctor, Gender, Patient, Staff, TimeSlot,
    };
    use clinica_db_memory::InMemoryStore;
    use time::macros::{date, datetime};

    async fn store_with_appointment(
        start: OffsetDateTime,
    ) -> (Arc<InMemoryStore>, Appointment) {
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

        let slot = TimeSlot::from_start(start, kind.duration_minutes).unwrap();
        let appointment = store
            .insert_scheduled(Appointment::new(
                patient.id, doctor.id, kind.id, staff.id, slot,
            ))
            .await
            .unwrap();
        (store, appointment)
    }

    fn manager(store: Arc<InMemoryStore>, policy: CancellationPolicy) -> LifecycleManager {
        LifecycleManager::new(store, policy)
    }

    #[tokio::test]
    async fn test_scheduled_to_completed() {
        let (store, appt) = store_with_appointment(datetime!(2026-03-02 09:00 UTC)).await;
        let manager = manager(store, CancellationPolicy::default());

        let updated = manager
            .transition(
                appt.id,
                AppointmentStatus::Completed,
                datetime!(2026-03-02 09:45 UTC),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::Completed);
    }

    #[tokio::test]
    async fn test_terminal_states_reject_transitions() {
        for terminal in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            // Far in the future so cancellations pass the notice check
            let (store, appt) =
                store_with_appointment(datetime!(2099-03-02 09:00 UTC)).await;
            let manager = manager(store, CancellationPolicy::default());
            let now = datetime!(2026-03-01 09:00 UTC);

            manager.transition(appt.id, terminal, now).await.unwrap();

            for target in [
                AppointmentStatus::Scheduled,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ] {
                let err = manager.transition(appt.id, target, now).await.unwrap_err();
                assert!(
                    matches!(err, LifecycleError::InvalidTransition { from, .. } if from == terminal),
                    "expected InvalidTransition from {terminal}, got {err}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_transition_to_scheduled_is_never_legal() {
        let (store, appt) = store_with_appointment(datetime!(2099-03-02 09:00 UTC)).await;
        let manager = manager(store, CancellationPolicy::default());
        let err = manager
            .transition(
                appt.id,
                AppointmentStatus::Scheduled,
                datetime!(2026-03-01 09:00 UTC),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_late_cancellation_blocked() {
        let (store, appt) = store_with_appointment(datetime!(2026-03-02 09:00 UTC)).await;
        let manager = manager(store.clone(), CancellationPolicy::default());

        // 12 hours of notice against a 24-hour policy
        let err = manager
            .transition(
                appt.id,
                AppointmentStatus::Cancelled,
                datetime!(2026-03-01 21:00 UTC),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::LatePolicyViolation { .. }));

        // The appointment is untouched and can still be cancelled in time
        let still = store.get_appointment(appt.id).await.unwrap().unwrap();
        assert_eq!(still.status, AppointmentStatus::Scheduled);

        manager
            .transition(
                appt.id,
                AppointmentStatus::Cancelled,
                datetime!(2026-02-28 09:00 UTC),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_late_cancellation_advisory_goes_through() {
        let (store, appt) = store_with_appointment(datetime!(2026-03-02 09:00 UTC)).await;
        let policy = CancellationPolicy {
            notice_hours: 24,
            enforcement: CancellationEnforcement::Advise,
        };
        let manager = manager(store, policy);

        let updated = manager
            .transition(
                appt.id,
                AppointmentStatus::Cancelled,
                datetime!(2026-03-01 21:00 UTC),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_no_show_is_not_policy_checked() {
        let (store, appt) = store_with_appointment(datetime!(2026-03-02 09:00 UTC)).await;
        let manager = manager(store, CancellationPolicy::default());

        // Minutes after the start, no-show is still fine
        let updated = manager
            .transition(
                appt.id,
                AppointmentStatus::NoShow,
                datetime!(2026-03-02 09:20 UTC),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::NoShow);
    }

    #[tokio::test]
    async fn test_unknown_appointment() {
        let (store, _) = store_with_appointment(datetime!(2026-03-02 09:00 UTC)).await;
        let manager = manager(store, CancellationPolicy::default());
        let err = manager
            .transition(
                AppointmentId::new(),
                AppointmentStatus::Completed,
                datetime!(2026-03-02 10:00 UTC),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
    }
}
