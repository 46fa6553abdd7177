use axum::{routing::get, Router};

use super::handlers;

/// Creates the live notification router
///
/// # Routes
/// - `GET /ws/doctor?token=` - WebSocket carrying session updates for the caller's patients
///
/// Authenticates from the query string, so it sits outside `resolve_identity`.
pub fn notifications_routes() -> Router {
    Router::new().route("/ws/doctor", get(handlers::doctor_socket))
}
