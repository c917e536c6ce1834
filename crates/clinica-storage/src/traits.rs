//! Storage traits for the clinic entity store.
//!
//! This module defines the contract that all storage backends must implement.

use async_trait::async_trait;

use crate::error::StorageError;
use clinica_core::{
    Appointment, AppointmentId, AppointmentStatus, AppointmentType, AppointmentTypeId,
    ContactUpdate, Department, DepartmentId, Doctor, DoctorId, Invoice, InvoiceId, InvoiceItem,
    MedicalRecord, Patient, PatientId, Staff, StaffId, TimeSlot,
};

/// The entity store that owns all clinic records.
///
/// Implementations must be thread-safe (`Send + Sync`) and must enforce, at
/// commit time, the constraints that a relational schema would express
/// declaratively: uniqueness of emails, license numbers, and names;
/// resolution of every foreign reference; and the no-overlap rule for a
/// doctor's scheduled appointments.
///
/// # Atomicity
///
/// [`insert_scheduled`](ClinicStore::insert_scheduled) is the one compound
/// write in the system: the overlap check against the doctor's scheduled
/// appointments and the insert must be indivisible as observed by concurrent
/// bookings for the same doctor. [`transition_status`](ClinicStore::transition_status)
/// is a compare-and-swap for the same reason.
///
/// # Example
///
/// ```ignore
/// use clinica_storage::{ClinicStore, StorageError};
///
/// async fn doctor_is_active(store: &dyn ClinicStore, id: DoctorId) -> Result<bool, StorageError> {
///     Ok(store.get_doctor(id).await?.is_some_and(|d| d.active))
/// }
/// ```
#[async_trait]
pub trait ClinicStore: Send + Sync {
    // ==================== Patients ====================

    /// Creates a new patient.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the email is already registered.
    async fn create_patient(&self, patient: Patient) -> Result<Patient, StorageError>;

    /// Reads a patient by ID. Returns `None` if the patient does not exist.
    async fn get_patient(&self, id: PatientId) -> Result<Option<Patient>, StorageError>;

    /// Applies a contact update to an existing patient.
    ///
    /// Identity fields are immutable; only contact fields change. A new
    /// email must remain unique across patients.
    async fn update_patient_contact(
        &self,
        id: PatientId,
        update: ContactUpdate,
    ) -> Result<Patient, StorageError>;

    /// Lists all patients.
    async fn list_patients(&self) -> Result<Vec<Patient>, StorageError>;

    // ==================== Doctors ====================

    /// Creates a new doctor.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the email or license number
    /// is already registered.
    async fn create_doctor(&self, doctor: Doctor) -> Result<Doctor, StorageError>;

    /// Reads a doctor by ID.
    async fn get_doctor(&self, id: DoctorId) -> Result<Option<Doctor>, StorageError>;

    /// Lists all doctors.
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StorageError>;

    /// Sets a doctor's active flag. Doctors are deactivated, never deleted.
    async fn set_doctor_active(
        &self,
        id: DoctorId,
        active: bool,
    ) -> Result<Doctor, StorageError>;

    /// Adds an appointment type to a doctor's capability set.
    ///
    /// Both the doctor and the type must resolve.
    async fn grant_capability(
        &self,
        doctor_id: DoctorId,
        type_id: AppointmentTypeId,
    ) -> Result<(), StorageError>;

    /// Removes an appointment type from a doctor's capability set.
    async fn revoke_capability(
        &self,
        doctor_id: DoctorId,
        type_id: AppointmentTypeId,
    ) -> Result<(), StorageError>;

    /// Lists the appointment types a doctor can perform.
    async fn doctor_capabilities(
        &self,
        doctor_id: DoctorId,
    ) -> Result<Vec<AppointmentTypeId>, StorageError>;

    /// Whether the doctor can perform the given appointment type.
    async fn has_capability(
        &self,
        doctor_id: DoctorId,
        type_id: AppointmentTypeId,
    ) -> Result<bool, StorageError>;

    // ==================== Staff ====================

    /// Creates a new staff member.
    async fn create_staff(&self, staff: Staff) -> Result<Staff, StorageError>;

    /// Reads a staff member by ID.
    async fn get_staff(&self, id: StaffId) -> Result<Option<Staff>, StorageError>;

    // ==================== Departments ====================

    /// Creates a department; the name is unique across the clinic.
    async fn create_department(&self, department: Department)
    -> Result<Department, StorageError>;

    /// Reads a department by ID.
    async fn get_department(
        &self,
        id: DepartmentId,
    ) -> Result<Option<Department>, StorageError>;

    /// Sets or clears the department head. A head doctor must resolve.
    async fn set_department_head(
        &self,
        id: DepartmentId,
        head: Option<DoctorId>,
    ) -> Result<Department, StorageError>;

    // ==================== Appointment types ====================

    /// Creates an appointment type; the name is unique.
    async fn create_appointment_type(
        &self,
        appointment_type: AppointmentType,
    ) -> Result<AppointmentType, StorageError>;

    /// Reads an appointment type by ID.
    async fn get_appointment_type(
        &self,
        id: AppointmentTypeId,
    ) -> Result<Option<AppointmentType>, StorageError>;

    /// Lists all appointment types.
    async fn list_appointment_types(&self) -> Result<Vec<AppointmentType>, StorageError>;

    // ==================== Appointments ====================

    /// Atomically checks for overlap and inserts a `Scheduled` appointment.
    ///
    /// The overlap check considers only the doctor's `Scheduled`
    /// appointments, under half-open `[start, end)` semantics. All foreign
    /// references are re-checked at commit time.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::SlotConflict` if the interval overlaps an
    /// existing scheduled appointment for the doctor, and
    /// `StorageError::ReferenceViolation` for any unresolved reference.
    async fn insert_scheduled(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, StorageError>;

    /// Reads an appointment by ID.
    async fn get_appointment(
        &self,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, StorageError>;

    /// Compare-and-swap on appointment status.
    ///
    /// Succeeds only if the current status equals `expected`; otherwise
    /// returns `StorageError::StateConflict` with the status actually found.
    async fn transition_status(
        &self,
        id: AppointmentId,
        expected: AppointmentStatus,
        new: AppointmentStatus,
    ) -> Result<Appointment, StorageError>;

    /// The doctor's `Scheduled` appointments overlapping `range`,
    /// ordered by start ascending.
    async fn scheduled_for_doctor(
        &self,
        doctor_id: DoctorId,
        range: TimeSlot,
    ) -> Result<Vec<Appointment>, StorageError>;

    /// All appointments (any status) starting inside `range`, ordered by
    /// start ascending. Used by the reporting views.
    async fn appointments_in_range(
        &self,
        range: TimeSlot,
    ) -> Result<Vec<Appointment>, StorageError>;

    // ==================== Medical records ====================

    /// Creates a medical record; patient, doctor, and the optional
    /// appointment must all resolve.
    async fn create_medical_record(
        &self,
        record: MedicalRecord,
    ) -> Result<MedicalRecord, StorageError>;

    /// A patient's records, most recent first.
    async fn records_for_patient(
        &self,
        patient_id: PatientId,
    ) -> Result<Vec<MedicalRecord>, StorageError>;

    // ==================== Invoices ====================

    /// Creates an invoice; the patient and optional appointment must resolve.
    async fn create_invoice(&self, invoice: Invoice) -> Result<Invoice, StorageError>;

    /// Reads an invoice by ID.
    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StorageError>;

    /// Appends a line item to an existing invoice.
    async fn add_invoice_item(&self, item: InvoiceItem) -> Result<InvoiceItem, StorageError>;

    /// Line items for an invoice, in insertion order.
    async fn invoice_items(&self, invoice_id: InvoiceId)
    -> Result<Vec<InvoiceItem>, StorageError>;

    /// Records a payment against an invoice, flipping it to `Paid` once
    /// fully covered.
    async fn record_invoice_payment(
        &self,
        id: InvoiceId,
        amount_cents: i64,
    ) -> Result<Invoice, StorageError>;

    // ==================== Metadata ====================

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
