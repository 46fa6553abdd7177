//! Request-scoped identity resolution
//!
//! `resolve_identity` runs in front of every protected route. It turns the
//! `Authorization: Bearer <token>` header into an `AuthedUser` stored in the
//! request extensions; requests without a valid credential never reach the
//! handler.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::extractors::AuthedUser;
use super::provider::IdentityProvider;
use crate::common::{safe_email_log, ApiError, SharedState};

pub async fn resolve_identity(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let state = req
        .extensions()
        .get::<SharedState>()
        .cloned()
        .ok_or_else(|| ApiError::InternalServer("missing app state".to_string()))?;
    let identity = state.read().await.identity.clone();

    let token = match bearer_token(req.headers()) {
        Some(token) => token.to_string(),
        None => {
            warn!(path = %req.uri().path(), "Authentication failed: missing Authorization header");
            return Err(ApiError::Unauthorized("Not authenticated".to_string()));
        }
    };

    let user = authenticate_token(identity.as_ref(), &token).await?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Resolves a raw token to the caller. Shared with the WebSocket upgrade,
/// which receives its token as a query parameter.
pub async fn authenticate_token(
    identity: &dyn IdentityProvider,
    token: &str,
) -> Result<AuthedUser, ApiError> {
    let user = identity.verify_token(token).await?;
    debug!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        role = ?user.role,
        "Identity resolved"
    );
    Ok(AuthedUser::from(user))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
