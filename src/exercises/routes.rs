use axum::{middleware, routing::get, Router};

use super::handlers;
use crate::auth::resolve_identity;

/// Creates the exercise catalog router
///
/// # Routes
/// - `GET /exercises` - Catalog readable by any signed-in user
pub fn exercises_routes() -> Router {
    Router::new()
        .route("/exercises", get(handlers::list_exercises))
        .route_layer(middleware::from_fn(resolve_identity))
}
