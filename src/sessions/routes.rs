use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::auth::resolve_identity;

/// Creates the exercise session router
///
/// # Routes
/// - `POST /sessions` - Start a session
/// - `GET /sessions/:session_id` - One own session with its exercise
/// - `PATCH /sessions/:session_id` - Partial update, notifies the doctor
pub fn sessions_routes() -> Router {
    Router::new()
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:session_id",
            get(handlers::get_session).patch(handlers::update_session),
        )
        .route_layer(middleware::from_fn(resolve_identity))
}
