//! End-to-end booking and lifecycle flows driven through the public
//! engines against the in-memory store.

use std::sync::Arc;

use clinica_config::{CancellationPolicy, ClinicSettings};
use clinica_core::{
    Appointment, AppointmentStatus, AppointmentType, Doctor, Gender, Patient, Staff, TimeSlot,
};
use clinica_db_memory::InMemoryStore;
use clinica_scheduling::{
    AvailabilityCalculator, BookingEngine, BookingError, BookingRequest, LifecycleError,
    LifecycleManager,
};
use clinica_storage::ClinicStore;
use time::OffsetDateTime;
use time::macros::{date, datetime};

struct Clinic {
    store: Arc<InMemoryStore>,
    booking: BookingEngine,
    lifecycle: LifecycleManager,
    availability: AvailabilityCalculator,
    patient: Patient,
    doctor: Doctor,
    kind: AppointmentType,
    staff: Staff,
}

async fn clinic() -> Clinic {
    let store = Arc::new(InMemoryStore::new());
    let settings = Arc::new(ClinicSettings::default());

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
            Doctor::new("Amira", "Hassan", "Cardiology", "LIC-1", "amira@clinic.org").unwrap(),
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

    let dyn_store: Arc<dyn ClinicStore> = store.clone();
    Clinic {
        booking: BookingEngine::new(dyn_store.clone()),
        lifecycle: LifecycleManager::new(dyn_store.clone(), CancellationPolicy::default()),
        availability: AvailabilityCalculator::new(dyn_store, settings),
        store,
        patient,
        doctor,
        kind,
        staff,
    }
}

impl Clinic {
    fn request_at(&self, start: OffsetDateTime) -> BookingRequest {
        BookingRequest {
            patient_id: self.patient.id,
            doctor_id: self.doctor.id,
            type_id: self.kind.id,
            requested_start: start,
            created_by: self.staff.id,
            notes: None,
        }
    }
}

#[tokio::test]
async fn booked_slot_conflicts_and_adjacent_slot_succeeds() {
    let clinic = clinic().await;

    // Doctor has one scheduled appointment 09:00-09:30
    let first = clinic
        .booking
        .book(clinic.request_at(datetime!(2026-03-02 09:00 UTC)))
        .await
        .unwrap();
    assert_eq!(first.status, AppointmentStatus::Scheduled);

    // 09:15 overlaps and is rejected
    let err = clinic
        .booking
        .book(clinic.request_at(datetime!(2026-03-02 09:15 UTC)))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotConflict { .. }));

    // 09:30 is back-to-back and succeeds
    let second = clinic
        .booking
        .book(clinic.request_at(datetime!(2026-03-02 09:30 UTC)))
        .await
        .unwrap();
    assert_eq!(second.status, AppointmentStatus::Scheduled);

    // Completing the 09:00 appointment works once
    let completed = clinic
        .lifecycle
        .transition(
            first.id,
            AppointmentStatus::Completed,
            datetime!(2026-03-02 09:45 UTC),
        )
        .await
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    // A second transition out of the terminal state fails
    let err = clinic
        .lifecycle
        .transition(
            first.id,
            AppointmentStatus::Cancelled,
            datetime!(2026-03-02 09:50 UTC),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
}

#[tokio::test]
async fn capability_mismatch_beats_slot_availability() {
    let clinic = clinic().await;
    let other_kind = clinic
        .store
        .create_appointment_type(AppointmentType::new("Surgery consult", 60, 20_000).unwrap())
        .await
        .unwrap();

    // Wide-open schedule, but the doctor cannot perform this type
    let mut request = clinic.request_at(datetime!(2026-03-02 09:00 UTC));
    request.type_id = other_kind.id;
    let err = clinic.booking.book(request).await.unwrap_err();
    assert!(matches!(err, BookingError::CapabilityMismatch { .. }));
}

#[tokio::test]
async fn inactive_doctor_cannot_be_booked() {
    let clinic = clinic().await;
    clinic
        .store
        .set_doctor_active(clinic.doctor.id, false)
        .await
        .unwrap();

    let err = clinic
        .booking
        .book(clinic.request_at(datetime!(2026-03-02 09:00 UTC)))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::DoctorInactive(_)));

    // Availability refuses for the same reason
    let range = TimeSlot::new(
        datetime!(2026-03-02 00:00 UTC),
        datetime!(2026-03-03 00:00 UTC),
    )
    .unwrap();
    let err = clinic
        .availability
        .free_slots(clinic.doctor.id, clinic.kind.id, range, None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::DoctorInactive(_)));
}

#[tokio::test]
async fn unknown_references_are_rejected() {
    let clinic = clinic().await;

    let mut request = clinic.request_at(datetime!(2026-03-02 09:00 UTC));
    request.patient_id = clinica_core::PatientId::new();
    let err = clinic.booking.book(request).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidReference { .. }));

    let mut request = clinic.request_at(datetime!(2026-03-02 09:00 UTC));
    request.created_by = clinica_core::StaffId::new();
    let err = clinic.booking.book(request).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidReference { .. }));
}

#[tokio::test]
async fn free_slots_and_bookings_agree_on_overlap() {
    // Randomized cross-check: book a batch of random same-day slots, then
    // assert that (a) accepted bookings never overlap pairwise and (b) the
    // availability iterator never offers a slot overlapping a booking.
    let clinic = clinic().await;
    let mut rng = fastrand::Rng::with_seed(0x5eed);

    let base = datetime!(2026-03-02 08:00 UTC);
    let mut accepted: Vec<Appointment> = Vec::new();
    for _ in 0..40 {
        // Starts on 5-minute marks anywhere in the business day
        let offset_minutes = i64::from(rng.u32(0..120)) * 5;
        let start = base + time::Duration::minutes(offset_minutes);
        match clinic.booking.book(clinic.request_at(start)).await {
            Ok(appointment) => accepted.push(appointment),
            Err(BookingError::SlotConflict { .. }) => {}
            Err(other) => panic!("unexpected booking failure: {other}"),
        }
    }
    assert!(!accepted.is_empty());

    // (a) pairwise disjoint
    for (i, a) in accepted.iter().enumerate() {
        for b in accepted.iter().skip(i + 1) {
            assert!(
                !a.slot().overlaps(&b.slot()),
                "accepted bookings overlap: {} vs {}",
                a.slot(),
                b.slot()
            );
        }
    }

    // (b) availability agrees with the booking engine's predicate
    let range = TimeSlot::new(
        datetime!(2026-03-02 00:00 UTC),
        datetime!(2026-03-03 00:00 UTC),
    )
    .unwrap();
    let free = clinic
        .availability
        .free_slots(clinic.doctor.id, clinic.kind.id, range, None)
        .await
        .unwrap();
    for slot in free {
        for appointment in &accepted {
            assert!(
                !slot.overlaps(&appointment.slot()),
                "free slot {} overlaps booking {}",
                slot,
                appointment.slot()
            );
        }
    }
}

#[tokio::test]
async fn every_offered_slot_is_bookable() {
    let clinic = clinic().await;
    clinic
        .booking
        .book(clinic.request_at(datetime!(2026-03-02 09:00 UTC)))
        .await
        .unwrap();

    let range = TimeSlot::new(
        datetime!(2026-03-02 08:00 UTC),
        datetime!(2026-03-02 12:00 UTC),
    )
    .unwrap();
    let offered: Vec<TimeSlot> = clinic
        .availability
        .free_slots(clinic.doctor.id, clinic.kind.id, range, None)
        .await
        .unwrap()
        .collect();

    // Book the first offered slot; it must commit cleanly
    let first = offered.first().expect("at least one free slot");
    clinic
        .booking
        .book(clinic.request_at(first.start))
        .await
        .unwrap();
}
