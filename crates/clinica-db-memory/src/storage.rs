use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use tokio::sync::RwLock;
use tracing::debug;

use clinica_core::{
    Appointment, AppointmentId, AppointmentStatus, AppointmentType, AppointmentTypeId,
    ContactUpdate, Department, DepartmentId, Doctor, DoctorId, EntityKind, Invoice, InvoiceId,
    InvoiceItem, MedicalRecord, MedicalRecordId, Patient, PatientId, Staff, StaffId, TimeSlot,
};
use clinica_storage::{ClinicStore, StorageError};

/// In-memory clinic store using papaya lock-free HashMaps.
///
/// This storage implementation provides:
/// - Lock-free concurrent reads via papaya::HashMap
/// - Commit-time enforcement of uniqueness and reference constraints
/// - Per-doctor serialization of the appointment check-and-insert, so two
///   concurrent bookings for the same doctor can never both commit an
///   overlapping interval
#[derive(Debug, Default)]
pub struct InMemoryStore {
    patients: PapayaHashMap<PatientId, Patient>,
    doctors: PapayaHashMap<DoctorId, Doctor>,
    staff: PapayaHashMap<StaffId, Staff>,
    departments: PapayaHashMap<DepartmentId, Department>,
    appointment_types: PapayaHashMap<AppointmentTypeId, AppointmentType>,
    appointments: PapayaHashMap<AppointmentId, Appointment>,
    records: PapayaHashMap<MedicalRecordId, MedicalRecord>,
    invoices: PapayaHashMap<InvoiceId, Invoice>,
    /// Line items per invoice, in insertion order.
    invoice_items: RwLock<HashMap<InvoiceId, Vec<InvoiceItem>>>,
    /// Capability sets: doctor -> appointment types they can perform.
    capabilities: RwLock<HashMap<DoctorId, BTreeSet<AppointmentTypeId>>>,
    /// Serializes entity writers so uniqueness checks and inserts are one unit.
    entity_write_lock: StdMutex<()>,
    /// Per-doctor booking locks held across the overlap check and insert.
    booking_locks: StdMutex<HashMap<DoctorId, Arc<StdMutex<()>>>>,
}

impl InMemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entities(&self) -> std::sync::MutexGuard<'_, ()> {
        self.entity_write_lock
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Fetches (creating on first use) the booking lock for a doctor.
    fn booking_lock(&self, doctor_id: DoctorId) -> Arc<StdMutex<()>> {
        let mut locks = self
            .booking_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        locks
            .entry(doctor_id)
            .or_insert_with(|| Arc::new(StdMutex::new(())))
            .clone()
    }

    fn patient_exists(&self, id: PatientId) -> bool {
        self.patients.pin().get(&id).is_some()
    }

    fn doctor_exists(&self, id: DoctorId) -> bool {
        self.doctors.pin().get(&id).is_some()
    }

    fn staff_exists(&self, id: StaffId) -> bool {
        self.staff.pin().get(&id).is_some()
    }

    fn type_exists(&self, id: AppointmentTypeId) -> bool {
        self.appointment_types.pin().get(&id).is_some()
    }

    fn appointment_exists(&self, id: AppointmentId) -> bool {
        self.appointments.pin().get(&id).is_some()
    }

    /// The doctor's scheduled appointments overlapping `slot`, unsorted.
    fn scheduled_conflicts(&self, doctor_id: DoctorId, slot: &TimeSlot) -> Vec<Appointment> {
        let guard = self.appointments.pin();
        guard
            .iter()
            .filter(|(_, a)| {
                a.doctor_id == doctor_id
                    && a.status == AppointmentStatus::Scheduled
                    && a.slot().overlaps(slot)
            })
            .map(|(_, a)| a.clone())
            .collect()
    }
}

#[async_trait]
impl ClinicStore for InMemoryStore {
    // ==================== Patients ====================

    async fn create_patient(&self, patient: Patient) -> Result<Patient, StorageError> {
        let _write = self.lock_entities();
        let guard = self.patients.pin();
        if guard.get(&patient.id).is_some() {
            return Err(StorageError::already_exists(
                EntityKind::Patient.to_string(),
                "id",
                patient.id.to_string(),
            ));
        }
        if guard
            .iter()
            .any(|(_, p)| p.email.eq_ignore_ascii_case(&patient.email))
        {
            return Err(StorageError::already_exists(
                EntityKind::Patient.to_string(),
                "email",
                patient.email.clone(),
            ));
        }
        guard.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn get_patient(&self, id: PatientId) -> Result<Option<Patient>, StorageError> {
        Ok(self.patients.pin().get(&id).cloned())
    }

    async fn update_patient_contact(
        &self,
        id: PatientId,
        update: ContactUpdate,
    ) -> Result<Patient, StorageError> {
        let _write = self.lock_entities();
        let guard = self.patients.pin();
        let current = guard
            .get(&id)
            .ok_or_else(|| StorageError::not_found(EntityKind::Patient.to_string(), id))?;

        if let Some(new_email) = update.email.as_deref()
            && guard
                .iter()
                .any(|(pid, p)| *pid != id && p.email.eq_ignore_ascii_case(new_email))
        {
            return Err(StorageError::already_exists(
                EntityKind::Patient.to_string(),
                "email",
                new_email.to_string(),
            ));
        }

        let mut updated = current.clone();
        updated
            .update_contact(update)
            .map_err(|e| StorageError::invalid_entity(e.to_string()))?;
        guard.insert(id, updated.clone());
        Ok(updated)
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, StorageError> {
        let guard = self.patients.pin();
        let mut patients: Vec<Patient> = guard.iter().map(|(_, p)| p.clone()).collect();
        patients.sort_by(|a, b| a.last_name.cmp(&b.last_name).then(a.id.cmp(&b.id)));
        Ok(patients)
    }

    // ==================== Doctors ====================

    async fn create_doctor(&self, doctor: Doctor) -> Result<Doctor, StorageError> {
        let _write = self.lock_entities();
        let guard = self.doctors.pin();
        if guard.get(&doctor.id).is_some() {
            return Err(StorageError::already_exists(
                EntityKind::Doctor.to_string(),
                "id",
                doctor.id.to_string(),
            ));
        }
        if guard
            .iter()
            .any(|(_, d)| d.email.eq_ignore_ascii_case(&doctor.email))
        {
            return Err(StorageError::already_exists(
                EntityKind::Doctor.to_string(),
                "email",
                doctor.email.clone(),
            ));
        }
        if guard
            .iter()
            .any(|(_, d)| d.license_number == doctor.license_number)
        {
            return Err(StorageError::already_exists(
                EntityKind::Doctor.to_string(),
                "license_number",
                doctor.license_number.clone(),
            ));
        }
        guard.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    async fn get_doctor(&self, id: DoctorId) -> Result<Option<Doctor>, StorageError> {
        Ok(self.doctors.pin().get(&id).cloned())
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, StorageError> {
        let guard = self.doctors.pin();
        let mut doctors: Vec<Doctor> = guard.iter().map(|(_, d)| d.clone()).collect();
        doctors.sort_by(|a, b| a.last_name.cmp(&b.last_name).then(a.id.cmp(&b.id)));
        Ok(doctors)
    }

    async fn set_doctor_active(&self, id: DoctorId, active: bool) -> Result<Doctor, StorageError> {
        let _write = self.lock_entities();
        let guard = self.doctors.pin();
        let current = guard
            .get(&id)
            .ok_or_else(|| StorageError::not_found(EntityKind::Doctor.to_string(), id))?;
        let mut updated = current.clone();
        updated.active = active;
        guard.insert(id, updated.clone());
        debug!(doctor_id = %id, active, "doctor active flag changed");
        Ok(updated)
    }

    async fn grant_capability(
        &self,
        doctor_id: DoctorId,
        type_id: AppointmentTypeId,
    ) -> Result<(), StorageError> {
        if !self.doctor_exists(doctor_id) {
            return Err(StorageError::reference_violation(
                EntityKind::Doctor.to_string(),
                doctor_id,
            ));
        }
        if !self.type_exists(type_id) {
            return Err(StorageError::reference_violation(
                EntityKind::AppointmentType.to_string(),
                type_id,
            ));
        }
        let mut capabilities = self.capabilities.write().await;
        capabilities.entry(doctor_id).or_default().insert(type_id);
        Ok(())
    }

    async fn revoke_capability(
        &self,
        doctor_id: DoctorId,
        type_id: AppointmentTypeId,
    ) -> Result<(), StorageError> {
        let mut capabilities = self.capabilities.write().await;
        if let Some(set) = capabilities.get_mut(&doctor_id) {
            set.remove(&type_id);
        }
        Ok(())
    }

    async fn doctor_capabilities(
        &self,
        doctor_id: DoctorId,
    ) -> Result<Vec<AppointmentTypeId>, StorageError> {
        let capabilities = self.capabilities.read().await;
        Ok(capabilities
            .get(&doctor_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn has_capability(
        &self,
        doctor_id: DoctorId,
        type_id: AppointmentTypeId,
    ) -> Result<bool, StorageError> {
        let capabilities = self.capabilities.read().await;
        Ok(capabilities
            .get(&doctor_id)
            .is_some_and(|set| set.contains(&type_id)))
    }

    // ==================== Staff ====================

    async fn create_staff(&self, staff: Staff) -> Result<Staff, StorageError> {
        let _write = self.lock_entities();
        let guard = self.staff.pin();
        if guard.get(&staff.id).is_some() {
            return Err(StorageError::already_exists(
                EntityKind::Staff.to_string(),
                "id",
                staff.id.to_string(),
            ));
        }
        guard.insert(staff.id, staff.clone());
        Ok(staff)
    }

    async fn get_staff(&self, id: StaffId) -> Result<Option<Staff>, StorageError> {
        Ok(self.staff.pin().get(&id).cloned())
    }

    // ==================== Departments ====================

    async fn create_department(
        &self,
        department: Department,
    ) -> Result<Department, StorageError> {
        if let Some(head) = department.head_doctor
            && !self.doctor_exists(head)
        {
            return Err(StorageError::reference_violation(
                EntityKind::Doctor.to_string(),
                head,
            ));
        }
        let _write = self.lock_entities();
        let guard = self.departments.pin();
        if guard
            .iter()
            .any(|(_, d)| d.name.eq_ignore_ascii_case(&department.name))
        {
            return Err(StorageError::already_exists(
                EntityKind::Department.to_string(),
                "name",
                department.name.clone(),
            ));
        }
        guard.insert(department.id, department.clone());
        Ok(department)
    }

    async fn get_department(
        &self,
        id: DepartmentId,
    ) -> Result<Option<Department>, StorageError> {
        Ok(self.departments.pin().get(&id).cloned())
    }

    async fn set_department_head(
        &self,
        id: DepartmentId,
        head: Option<DoctorId>,
    ) -> Result<Department, StorageError> {
        if let Some(doctor_id) = head
            && !self.doctor_exists(doctor_id)
        {
            return Err(StorageError::reference_violation(
                EntityKind::Doctor.to_string(),
                doctor_id,
            ));
        }
        let _write = self.lock_entities();
        let guard = self.departments.pin();
        let current = guard
            .get(&id)
            .ok_or_else(|| StorageError::not_found(EntityKind::Department.to_string(), id))?;
        let mut updated = current.clone();
        updated.head_doctor = head;
        guard.insert(id, updated.clone());
        Ok(updated)
    }

    // ==================== Appointment types ====================

    async fn create_appointment_type(
        &self,
        appointment_type: AppointmentType,
    ) -> Result<AppointmentType, StorageError> {
        let _write = self.lock_entities();
        let guard = self.appointment_types.pin();
        if guard
            .iter()
            .any(|(_, t)| t.name.eq_ignore_ascii_case(&appointment_type.name))
        {
            return Err(StorageError::already_exists(
                EntityKind::AppointmentType.to_string(),
                "name",
                appointment_type.name.clone(),
            ));
        }
        guard.insert(appointment_type.id, appointment_type.clone());
        Ok(appointment_type)
    }

    async fn get_appointment_type(
        &self,
        id: AppointmentTypeId,
    ) -> Result<Option<AppointmentType>, StorageError> {
        Ok(self.appointment_types.pin().get(&id).cloned())
    }

    async fn list_appointment_types(&self) -> Result<Vec<AppointmentType>, StorageError> {
        let guard = self.appointment_types.pin();
        let mut types: Vec<AppointmentType> = guard.iter().map(|(_, t)| t.clone()).collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    // ==================== Appointments ====================

    async fn insert_scheduled(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, StorageError> {
        if appointment.status != AppointmentStatus::Scheduled {
            return Err(StorageError::invalid_entity(format!(
                "new appointments must be scheduled, got {}",
                appointment.status
            )));
        }
        if appointment.scheduled_end <= appointment.scheduled_start {
            return Err(StorageError::invalid_entity(
                "appointment end must be after start",
            ));
        }

        // Commit-time reference checks
        if !self.patient_exists(appointment.patient_id) {
            return Err(StorageError::reference_violation(
                EntityKind::Patient.to_string(),
                appointment.patient_id,
            ));
        }
        if !self.doctor_exists(appointment.doctor_id) {
            return Err(StorageError::reference_violation(
                EntityKind::Doctor.to_string(),
                appointment.doctor_id,
            ));
        }
        if !self.type_exists(appointment.type_id) {
            return Err(StorageError::reference_violation(
                EntityKind::AppointmentType.to_string(),
                appointment.type_id,
            ));
        }
        if !self.staff_exists(appointment.created_by) {
            return Err(StorageError::reference_violation(
                EntityKind::Staff.to_string(),
                appointment.created_by,
            ));
        }

        // The overlap check and insert form one critical section per doctor:
        // concurrent bookings for the same doctor serialize here.
        let lock = self.booking_lock(appointment.doctor_id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let slot = appointment.slot();
        let conflicts = self.scheduled_conflicts(appointment.doctor_id, &slot);
        if !conflicts.is_empty() {
            debug!(
                doctor_id = %appointment.doctor_id,
                requested = %slot,
                conflicts = conflicts.len(),
                "slot conflict on insert"
            );
            return Err(StorageError::slot_conflict(
                appointment.doctor_id,
                slot.start,
                slot.end,
            ));
        }

        self.appointments
            .pin()
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get_appointment(
        &self,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, StorageError> {
        Ok(self.appointments.pin().get(&id).cloned())
    }

    async fn transition_status(
        &self,
        id: AppointmentId,
        expected: AppointmentStatus,
        new: AppointmentStatus,
    ) -> Result<Appointment, StorageError> {
        let current = self
            .appointments
            .pin()
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(EntityKind::Appointment.to_string(), id))?;

        // Serialize with bookings for the same doctor: a cancellation frees
        // the slot, so it must not interleave with an overlap check.
        let lock = self.booking_lock(current.doctor_id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let guard = self.appointments.pin();
        let current = guard
            .get(&id)
            .ok_or_else(|| StorageError::not_found(EntityKind::Appointment.to_string(), id))?;
        if current.status != expected {
            return Err(StorageError::state_conflict(
                id,
                expected,
                current.status,
            ));
        }
        let mut updated = current.clone();
        updated.status = new;
        guard.insert(id, updated.clone());
        Ok(updated)
    }

    async fn scheduled_for_doctor(
        &self,
        doctor_id: DoctorId,
        range: TimeSlot,
    ) -> Result<Vec<Appointment>, StorageError> {
        let mut appointments = self.scheduled_conflicts(doctor_id, &range);
        appointments.sort_by_key(|a| a.scheduled_start);
        Ok(appointments)
    }

    async fn appointments_in_range(
        &self,
        range: TimeSlot,
    ) -> Result<Vec<Appointment>, StorageError> {
        let guard = self.appointments.pin();
        let mut appointments: Vec<Appointment> = guard
            .iter()
            .filter(|(_, a)| range.contains_instant(a.scheduled_start))
            .map(|(_, a)| a.clone())
            .collect();
        appointments.sort_by_key(|a| a.scheduled_start);
        Ok(appointments)
    }

    // ==================== Medical records ====================

    async fn create_medical_record(
        &self,
        record: MedicalRecord,
    ) -> Result<MedicalRecord, StorageError> {
        if !self.patient_exists(record.patient_id) {
            return Err(StorageError::reference_violation(
                EntityKind::Patient.to_string(),
                record.patient_id,
            ));
        }
        if !self.doctor_exists(record.doctor_id) {
            return Err(StorageError::reference_violation(
                EntityKind::Doctor.to_string(),
                record.doctor_id,
            ));
        }
        if let Some(appointment_id) = record.appointment_id
            && !self.appointment_exists(appointment_id)
        {
            return Err(StorageError::reference_violation(
                EntityKind::Appointment.to_string(),
                appointment_id,
            ));
        }
        self.records.pin().insert(record.id, record.clone());
        Ok(record)
    }

    async fn records_for_patient(
        &self,
        patient_id: PatientId,
    ) -> Result<Vec<MedicalRecord>, StorageError> {
        let guard = self.records.pin();
        let mut records: Vec<MedicalRecord> = guard
            .iter()
            .filter(|(_, r)| r.patient_id == patient_id)
            .map(|(_, r)| r.clone())
            .collect();
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(records)
    }

    // ==================== Invoices ====================

    async fn create_invoice(&self, invoice: Invoice) -> Result<Invoice, StorageError> {
        if !self.patient_exists(invoice.patient_id) {
            return Err(StorageError::reference_violation(
                EntityKind::Patient.to_string(),
                invoice.patient_id,
            ));
        }
        if let Some(appointment_id) = invoice.appointment_id
            && !self.appointment_exists(appointment_id)
        {
            return Err(StorageError::reference_violation(
                EntityKind::Appointment.to_string(),
                appointment_id,
            ));
        }
        self.invoices.pin().insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StorageError> {
        Ok(self.invoices.pin().get(&id).cloned())
    }

    async fn add_invoice_item(&self, item: InvoiceItem) -> Result<InvoiceItem, StorageError> {
        if self.invoices.pin().get(&item.invoice_id).is_none() {
            return Err(StorageError::reference_violation(
                EntityKind::Invoice.to_string(),
                item.invoice_id,
            ));
        }
        let mut items = self.invoice_items.write().await;
        items.entry(item.invoice_id).or_default().push(item.clone());
        Ok(item)
    }

    async fn invoice_items(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<InvoiceItem>, StorageError> {
        let items = self.invoice_items.read().await;
        Ok(items.get(&invoice_id).cloned().unwrap_or_default())
    }

    async fn record_invoice_payment(
        &self,
        id: InvoiceId,
        amount_cents: i64,
    ) -> Result<Invoice, StorageError> {
        let _write = self.lock_entities();
        let guard = self.invoices.pin();
        let current = guard
            .get(&id)
            .ok_or_else(|| StorageError::not_found(EntityKind::Invoice.to_string(), id))?;
        let mut updated = current.clone();
        updated
            .record_payment(amount_cents)
            .map_err(|e| StorageError::invalid_entity(e.to_string()))?;
        guard.insert(id, updated.clone());
        Ok(updated)
    }

    // ==================== Metadata ====================

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
