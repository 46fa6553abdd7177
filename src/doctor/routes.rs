use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::auth::resolve_identity;

/// Creates the doctor-facing router
///
/// # Routes
/// - `GET /doctor/dashboard/stats` - Patient counts
/// - `POST /doctor/create_patient` - Create a patient account and profile
/// - `GET /doctor/patients` - Owned patients, newest first
/// - `GET /doctor/patients/:patient_id` - One owned patient
/// - `GET /doctor/patients/:patient_id/exercises` - A patient's assignments
/// - `GET /doctor/patients/:patient_id/stats` - A patient's session totals
/// - `GET /doctor/sessions/active` - Recent sessions across owned patients
/// - `POST /doctor/assignments` - Assign an exercise to several patients
pub fn doctor_routes() -> Router {
    Router::new()
        .route("/doctor/dashboard/stats", get(handlers::dashboard_stats))
        .route("/doctor/create_patient", post(handlers::create_patient))
        .route("/doctor/patients", get(handlers::list_patients))
        .route("/doctor/patients/:patient_id", get(handlers::get_patient))
        .route(
            "/doctor/patients/:patient_id/exercises",
            get(handlers::patient_exercises),
        )
        .route(
            "/doctor/patients/:patient_id/stats",
            get(handlers::patient_stats),
        )
        .route("/doctor/sessions/active", get(handlers::active_sessions))
        .route("/doctor/assignments", post(handlers::assign_exercise))
        .route_layer(middleware::from_fn(resolve_identity))
}
