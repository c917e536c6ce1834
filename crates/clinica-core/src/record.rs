use crate::error::Result;
use crate::id::{AppointmentId, DoctorId, MedicalRecordId, PatientId};
use crate::interval::now_utc;
use crate::validation::validate_non_empty;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A clinical note for a patient, written by a doctor, optionally tied
/// to the appointment it was produced in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: MedicalRecordId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<AppointmentId>,
    pub diagnosis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl MedicalRecord {
    pub fn new(
        patient_id: PatientId,
        doctor_id: DoctorId,
        diagnosis: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: MedicalRecordId::new(),
            patient_id,
            doctor_id,
            appointment_id: None,
            diagnosis: validate_non_empty("diagnosis", &diagnosis.into())?,
            treatment: None,
            prescription: None,
            recorded_at: now_utc(),
        })
    }

    pub fn for_appointment(mut self, appointment_id: AppointmentId) -> Self {
        self.appointment_id = Some(appointment_id);
        self
    }

    pub fn with_treatment(mut self, treatment: impl Into<String>) -> Self {
        self.treatment = Some(treatment.into());
        self
    }

    pub fn with_prescription(mut self, prescription: impl Into<String>) -> Self {
        self.prescription = Some(prescription.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_requires_diagnosis() {
        assert!(MedicalRecord::new(PatientId::new(), DoctorId::new(), "  ").is_err());
    }

    #[test]
    fn test_record_builders() {
        let record = MedicalRecord::new(PatientId::new(), DoctorId::new(), "Hypertension")
            .unwrap()
            .for_appointment(AppointmentId::new())
            .with_treatment("Lifestyle changes")
            .with_prescription("Lisinopril 10mg");
        assert!(record.appointment_id.is_some());
        assert_eq!(record.treatment.as_deref(), Some("Lifestyle changes"));
        assert_eq!(record.prescription.as_deref(), Some("Lisinopril 10mg"));
    }
}
