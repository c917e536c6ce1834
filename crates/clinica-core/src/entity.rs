use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity kinds stored by the clinic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Patient,
    Doctor,
    Staff,
    Department,
    AppointmentType,
    Appointment,
    MedicalRecord,
    Invoice,
    InvoiceItem,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Patient => write!(f, "Patient"),
            EntityKind::Doctor => write!(f, "Doctor"),
            EntityKind::Staff => write!(f, "Staff"),
            EntityKind::Department => write!(f, "Department"),
            EntityKind::AppointmentType => write!(f, "AppointmentType"),
            EntityKind::Appointment => write!(f, "Appointment"),
            EntityKind::MedicalRecord => write!(f, "MedicalRecord"),
            EntityKind::Invoice => write!(f, "Invoice"),
            EntityKind::InvoiceItem => write!(f, "InvoiceItem"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(EntityKind::Patient),
            "Doctor" => Ok(EntityKind::Doctor),
            "Staff" => Ok(EntityKind::Staff),
            "Department" => Ok(EntityKind::Department),
            "AppointmentType" => Ok(EntityKind::AppointmentType),
            "Appointment" => Ok(EntityKind::Appointment),
            "MedicalRecord" => Ok(EntityKind::MedicalRecord),
            "Invoice" => Ok(EntityKind::Invoice),
            "InvoiceItem" => Ok(EntityKind::InvoiceItem),
            _ => Err(CoreError::invalid_field(
                "entity_kind",
                format!("Unknown entity kind: {s}"),
            )),
        }
    }
}
