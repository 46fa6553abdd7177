use axum::{middleware, routing::get, Router};

use super::handlers;
use crate::auth::resolve_identity;

/// Creates the patient-facing router
///
/// # Routes
/// - `GET /patient/my_exercises` - Own assignments with the exercise nested
/// - `GET /patient/session/history` - Own sessions, newest first
/// - `GET /patient/dashboard/stats` - Completed sessions and assignment count
pub fn patient_routes() -> Router {
    Router::new()
        .route("/patient/my_exercises", get(handlers::my_exercises))
        .route("/patient/session/history", get(handlers::session_history))
        .route("/patient/dashboard/stats", get(handlers::dashboard_stats))
        .route_layer(middleware::from_fn(resolve_identity))
}
