use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use time::{Date, OffsetDateTime};

use clinica_core::{
    Appointment, AppointmentId, AppointmentStatus, AppointmentType, AppointmentTypeId,
    ContactUpdate, Department, Doctor, DoctorId, EntityKind, Gender, Invoice, InvoiceId,
    InvoiceItem, MedicalRecord, Patient, PatientId, Staff, TimeSlot, now_utc,
};
use clinica_scheduling::{BookingRequest, available_slots, todays_appointments};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "service": "Clinica Server",
        "clinic": state.settings.clinic.name,
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ready",
        "storage": state.store.backend_name(),
    });
    (StatusCode::OK, Json(body))
}

// ---- Patients ----

#[derive(Debug, Deserialize)]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Date,
    pub gender: Gender,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

pub async fn create_patient(
    State(state): State<AppState>,
    Json(body): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let mut patient = Patient::new(
        body.first_name,
        body.last_name,
        body.date_of_birth,
        body.gender,
        body.email,
    )?;
    if let Some(phone) = body.phone {
        patient = patient.with_phone(phone);
    }
    if let Some(address) = body.address {
        patient = patient.with_address(address);
    }
    let created = state.store.create_patient(patient).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<PatientId>,
) -> Result<Json<Patient>, ApiError> {
    let patient = state
        .store
        .get_patient(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{}/{id}", EntityKind::Patient)))?;
    Ok(Json(patient))
}

pub async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    Ok(Json(state.store.list_patients().await?))
}

pub async fn update_patient_contact(
    State(state): State<AppState>,
    Path(id): Path<PatientId>,
    Json(update): Json<ContactUpdate>,
) -> Result<Json<Patient>, ApiError> {
    Ok(Json(state.store.update_patient_contact(id, update).await?))
}

pub async fn records_for_patient(
    State(state): State<AppState>,
    Path(id): Path<PatientId>,
) -> Result<Json<Vec<MedicalRecord>>, ApiError> {
    state
        .store
        .get_patient(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{}/{id}", EntityKind::Patient)))?;
    Ok(Json(state.store.records_for_patient(id).await?))
}

// ---- Doctors ----

#[derive(Debug, Deserialize)]
pub struct CreateDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub license_number: String,
    pub email: String,
}

pub async fn create_doctor(
    State(state): State<AppState>,
    Json(body): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Doctor>), ApiError> {
    let doctor = Doctor::new(
        body.first_name,
        body.last_name,
        body.specialization,
        body.license_number,
        body.email,
    )?;
    let created = state.store.create_doctor(doctor).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<DoctorId>,
) -> Result<Json<Doctor>, ApiError> {
    let doctor = state
        .store
        .get_doctor(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{}/{id}", EntityKind::Doctor)))?;
    Ok(Json(doctor))
}

pub async fn list_doctors(
    State(state): State<AppState>,
) -> Result<Json<Vec<Doctor>>, ApiError> {
    Ok(Json(state.store.list_doctors().await?))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

pub async fn set_doctor_active(
    State(state): State<AppState>,
    Path(id): Path<DoctorId>,
    Json(body): Json<SetActiveRequest>,
) -> Result<Json<Doctor>, ApiError> {
    Ok(Json(state.store.set_doctor_active(id, body.active).await?))
}

pub async fn grant_capability(
    State(state): State<AppState>,
    Path((id, type_id)): Path<(DoctorId, AppointmentTypeId)>,
) -> Result<StatusCode, ApiError> {
    state.store.grant_capability(id, type_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_capability(
    State(state): State<AppState>,
    Path((id, type_id)): Path<(DoctorId, AppointmentTypeId)>,
) -> Result<StatusCode, ApiError> {
    state.store.revoke_capability(id, type_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    #[serde(rename = "type")]
    pub type_id: AppointmentTypeId,
    #[serde(with = "time::serde::rfc3339")]
    pub from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub to: OffsetDateTime,
    #[serde(default)]
    pub granularity: Option<u32>,
}

pub async fn doctor_slots(
    State(state): State<AppState>,
    Path(id): Path<DoctorId>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<TimeSlot>>, ApiError> {
    let range = TimeSlot::new(query.from, query.to)?;
    let slots = state
        .availability
        .free_slots(id, query.type_id, range, query.granularity)
        .await?;
    Ok(Json(slots.collect()))
}

// ---- Staff and departments ----

#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
}

pub async fn create_staff(
    State(state): State<AppState>,
    Json(body): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<Staff>), ApiError> {
    let mut staff = Staff::new(body.first_name, body.last_name, body.role)?;
    if let Some(email) = body.email {
        staff = staff.with_email(email)?;
    }
    let created = state.store.create_staff(staff).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub head_doctor: Option<DoctorId>,
}

pub async fn create_department(
    State(state): State<AppState>,
    Json(body): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    let mut department = Department::new(body.name)?;
    if let Some(location) = body.location {
        department = department.with_location(location);
    }
    department.head_doctor = body.head_doctor;
    let created = state.store.create_department(department).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ---- Appointment types ----

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentTypeRequest {
    pub name: String,
    pub duration_minutes: u32,
    pub base_price_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_appointment_type(
    State(state): State<AppState>,
    Json(body): Json<CreateAppointmentTypeRequest>,
) -> Result<(StatusCode, Json<AppointmentType>), ApiError> {
    let mut kind =
        AppointmentType::new(body.name, body.duration_minutes, body.base_price_cents)?;
    if let Some(description) = body.description {
        kind = kind.with_description(description);
    }
    let created = state.store.create_appointment_type(kind).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_appointment_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<AppointmentType>>, ApiError> {
    Ok(Json(state.store.list_appointment_types().await?))
}

// ---- Appointments ----

pub async fn book_appointment(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let appointment = state.booking.book(request).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = state
        .store
        .get_appointment(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{}/{id}", EntityKind::Appointment)))?;
    Ok(Json(appointment))
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: AppointmentStatus,
}

pub async fn transition_appointment(
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = state.lifecycle.transition(id, body.status, now_utc()).await?;
    Ok(Json(appointment))
}

// ---- Reporting views ----

pub async fn todays_appointments_view(
    State(state): State<AppState>,
) -> Result<Json<Vec<clinica_scheduling::TodaysAppointment>>, ApiError> {
    Ok(Json(
        todays_appointments(state.store.as_ref(), now_utc()).await?,
    ))
}

pub async fn available_slots_view(
    State(state): State<AppState>,
) -> Result<Json<Vec<clinica_scheduling::AvailableSlot>>, ApiError> {
    Ok(Json(
        available_slots(state.store.clone(), state.settings.clone(), now_utc()).await?,
    ))
}

// ---- Invoicing ----

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub patient_id: PatientId,
    #[serde(default)]
    pub appointment_id: Option<AppointmentId>,
    pub issue_date: Date,
    pub due_date: Date,
    pub total_cents: i64,
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(body): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let mut invoice = Invoice::new(
        body.patient_id,
        body.issue_date,
        body.due_date,
        body.total_cents,
    )?;
    if let Some(appointment_id) = body.appointment_id {
        invoice = invoice.for_appointment(appointment_id);
    }
    let created = state.store.create_invoice(invoice).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = state
        .store
        .get_invoice(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{}/{id}", EntityKind::Invoice)))?;
    Ok(Json(invoice))
}

#[derive(Debug, Deserialize)]
pub struct AddInvoiceItemRequest {
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub discount_cents: Option<i64>,
}

pub async fn add_invoice_item(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Json(body): Json<AddInvoiceItemRequest>,
) -> Result<(StatusCode, Json<InvoiceItem>), ApiError> {
    let mut item = InvoiceItem::new(id, body.description, body.quantity, body.unit_price_cents)?;
    if let Some(discount) = body.discount_cents {
        item = item.with_discount(discount)?;
    }
    let created = state.store.add_invoice_item(item).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ---- Medical records ----

#[derive(Debug, Deserialize)]
pub struct CreateMedicalRecordRequest {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    #[serde(default)]
    pub appointment_id: Option<AppointmentId>,
    pub diagnosis: String,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub prescription: Option<String>,
}

pub async fn create_medical_record(
    State(state): State<AppState>,
    Json(body): Json<CreateMedicalRecordRequest>,
) -> Result<(StatusCode, Json<MedicalRecord>), ApiError> {
    let mut record = MedicalRecord::new(body.patient_id, body.doctor_id, body.diagnosis)?;
    if let Some(appointment_id) = body.appointment_id {
        record = record.for_appointment(appointment_id);
    }
    if let Some(treatment) = body.treatment {
        record = record.with_treatment(treatment);
    }
    if let Some(prescription) = body.prescription {
        record = record.with_prescription(prescription);
    }
    let created = state.store.create_medical_record(record).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
