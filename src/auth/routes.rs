//! Authentication routes

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers;
use super::middleware::resolve_identity;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /auth/register` - Doctor self-registration
/// - `POST /auth/login` - Exchange email and password for a bearer token
/// - `GET /auth/me` - Resolved identity of the caller
pub fn auth_routes() -> Router {
    let protected = Router::new()
        .route("/auth/me", get(handlers::me))
        .route_layer(middleware::from_fn(resolve_identity));

    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .merge(protected)
}
