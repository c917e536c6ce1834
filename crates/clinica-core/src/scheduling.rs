use crate::error::{CoreError, Result};
use crate::id::{AppointmentId, AppointmentTypeId, DoctorId, PatientId, StaffId};
use crate::interval::{TimeSlot, now_utc};
use crate::validation::validate_non_empty;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// A bookable appointment kind with a fixed duration and base price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentType {
    pub id: AppointmentTypeId,
    pub name: String,
    pub duration_minutes: u32,
    pub base_price_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AppointmentType {
    /// Creates a type; zero-length durations are rejected here so every
    /// downstream slot computation can assume a positive duration.
    pub fn new(
        name: impl Into<String>,
        duration_minutes: u32,
        base_price_cents: i64,
    ) -> Result<Self> {
        if duration_minutes == 0 {
            return Err(CoreError::InvalidDuration(duration_minutes));
        }
        if base_price_cents < 0 {
            return Err(CoreError::invalid_field(
                "base_price_cents",
                "must not be negative",
            ));
        }
        Ok(Self {
            id: AppointmentTypeId::new(),
            name: validate_non_empty("name", &name.into())?,
            duration_minutes,
            base_price_cents,
            description: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Appointment lifecycle states.
///
/// `Scheduled` is the only initial state. The other three are terminal:
/// once an appointment is completed, cancelled, or marked a no-show it
/// never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Scheduled)
    }

    /// Legal lifecycle transitions: `Scheduled` to any terminal state.
    pub fn can_transition_to(&self, new: AppointmentStatus) -> bool {
        matches!(self, Self::Scheduled) && new != Self::Scheduled
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::NoShow => write!(f, "no_show"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scheduled" | "Scheduled" => Ok(Self::Scheduled),
            "completed" | "Completed" => Ok(Self::Completed),
            "cancelled" | "Cancelled" => Ok(Self::Cancelled),
            "no_show" | "no-show" | "NoShow" => Ok(Self::NoShow),
            _ => Err(CoreError::invalid_field(
                "status",
                format!("Unknown appointment status: {s}"),
            )),
        }
    }
}

/// A committed booking of one patient with one doctor for one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub type_id: AppointmentTypeId,
    pub created_by: StaffId,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_end: OffsetDateTime,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Appointment {
    /// Creates a `Scheduled` appointment over an already-validated slot.
    pub fn new(
        patient_id: PatientId,
        doctor_id: DoctorId,
        type_id: AppointmentTypeId,
        created_by: StaffId,
        slot: TimeSlot,
    ) -> Self {
        Self {
            id: AppointmentId::new(),
            patient_id,
            doctor_id,
            type_id,
            created_by,
            scheduled_start: slot.start,
            scheduled_end: slot.end,
            status: AppointmentStatus::Scheduled,
            notes: None,
            created_at: now_utc(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// The occupied interval as a [`TimeSlot`].
    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.scheduled_start,
            end: self.scheduled_end,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == AppointmentStatus::Scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn slot_at_nine() -> TimeSlot {
        TimeSlot::new(
            datetime!(2026-03-02 09:00 UTC),
            datetime!(2026-03-02 09:30 UTC),
        )
        .unwrap()
    }

    #[test]
    fn test_appointment_type_rejects_zero_duration() {
        let err = AppointmentType::new("Checkup", 0, 5000).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDuration(0)));
    }

    #[test]
    fn test_appointment_type_rejects_negative_price() {
        assert!(AppointmentType::new("Checkup", 30, -1).is_err());
        let t = AppointmentType::new("Checkup", 30, 5000)
            .unwrap()
            .with_description("Routine physical");
        assert_eq!(t.duration_minutes, 30);
        assert_eq!(t.description.as_deref(), Some("Routine physical"));
    }

    #[test]
    fn test_status_terminality() {
        assert!(!AppointmentStatus::Scheduled.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(AppointmentStatus::NoShow.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        let scheduled = AppointmentStatus::Scheduled;
        assert!(scheduled.can_transition_to(AppointmentStatus::Completed));
        assert!(scheduled.can_transition_to(AppointmentStatus::Cancelled));
        assert!(scheduled.can_transition_to(AppointmentStatus::NoShow));
        assert!(!scheduled.can_transition_to(AppointmentStatus::Scheduled));

        for terminal in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert!(!terminal.can_transition_to(AppointmentStatus::Scheduled));
            assert!(!terminal.can_transition_to(AppointmentStatus::Completed));
            assert!(!terminal.can_transition_to(AppointmentStatus::Cancelled));
            assert!(!terminal.can_transition_to(AppointmentStatus::NoShow));
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "no-show".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::NoShow
        );
        assert_eq!(
            "Completed".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::Completed
        );
        assert!("unknown".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_new_appointment_is_scheduled() {
        let appt = Appointment::new(
            PatientId::new(),
            DoctorId::new(),
            AppointmentTypeId::new(),
            StaffId::new(),
            slot_at_nine(),
        );
        assert!(appt.is_scheduled());
        assert_eq!(appt.slot(), slot_at_nine());
        assert!(appt.scheduled_end > appt.scheduled_start);
    }

    #[test]
    fn test_appointment_serialization() {
        let appt = Appointment::new(
            PatientId::new(),
            DoctorId::new(),
            AppointmentTypeId::new(),
            StaffId::new(),
            slot_at_nine(),
        )
        .with_notes("first visit");

        let json = serde_json::to_value(&appt).unwrap();
        assert_eq!(json["status"], "Scheduled");
        assert_eq!(json["scheduled_start"], "2026-03-02T09:00:00Z");
        assert_eq!(json["scheduled_end"], "2026-03-02T09:30:00Z");
        assert_eq!(json["notes"], "first visit");

        let back: Appointment = serde_json::from_value(json).unwrap();
        assert_eq!(back, appt);
    }
}
