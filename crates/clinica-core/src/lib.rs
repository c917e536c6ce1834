pub mod billing;
pub mod entity;
pub mod error;
pub mod id;
pub mod interval;
pub mod people;
pub mod record;
pub mod scheduling;
pub mod validation;

pub use billing::{Invoice, InvoiceItem, InvoiceStatus};
pub use entity::EntityKind;
pub use error::{CoreError, ErrorCategory, Result};
pub use id::{
    AppointmentId, AppointmentTypeId, DepartmentId, DoctorId, InvoiceId, InvoiceItemId,
    MedicalRecordId, PatientId, StaffId,
};
pub use interval::{TimeSlot, now_utc, round_down_to_step};
pub use people::{ContactUpdate, Department, Doctor, Gender, Patient, Staff};
pub use record::MedicalRecord;
pub use scheduling::{Appointment, AppointmentStatus, AppointmentType};
pub use validation::{validate_email, validate_non_empty};
