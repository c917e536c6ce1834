//! HTTP layer for the Clinica scheduling service.
//!
//! Wires the entity store, booking engine, lifecycle manager, and reporting
//! views into an axum router. The binary in `main.rs` loads configuration,
//! initializes tracing, and serves the router with graceful shutdown.

pub mod error;
pub mod handlers;
pub mod observability;
pub mod state;

use axum::Router;
use axum::routing::{get, patch, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Builds the service router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Patients
        .route(
            "/patients",
            post(handlers::create_patient).get(handlers::list_patients),
        )
        .route("/patients/{id}", get(handlers::get_patient))
        .route("/patients/{id}/contact", patch(handlers::update_patient_contact))
        .route(
            "/patients/{id}/medical-records",
            get(handlers::records_for_patient),
        )
        // Doctors
        .route(
            "/doctors",
            post(handlers::create_doctor).get(handlers::list_doctors),
        )
        .route("/doctors/{id}", get(handlers::get_doctor))
        .route("/doctors/{id}/active", put(handlers::set_doctor_active))
        .route(
            "/doctors/{id}/capabilities/{type_id}",
            post(handlers::grant_capability).delete(handlers::revoke_capability),
        )
        .route("/doctors/{id}/slots", get(handlers::doctor_slots))
        // Staff and departments
        .route("/staff", post(handlers::create_staff))
        .route("/departments", post(handlers::create_department))
        // Appointment types
        .route(
            "/appointment-types",
            post(handlers::create_appointment_type).get(handlers::list_appointment_types),
        )
        // Appointments
        .route("/appointments", post(handlers::book_appointment))
        .route("/appointments/{id}", get(handlers::get_appointment))
        .route(
            "/appointments/{id}/transition",
            post(handlers::transition_appointment),
        )
        // Reporting views
        .route(
            "/views/todays-appointments",
            get(handlers::todays_appointments_view),
        )
        .route("/views/available-slots", get(handlers::available_slots_view))
        // Invoicing
        .route("/invoices", post(handlers::create_invoice))
        .route("/invoices/{id}", get(handlers::get_invoice))
        .route("/invoices/{id}/items", post(handlers::add_invoice_item))
        // Medical records
        .route("/medical-records", post(handlers::create_medical_record))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
