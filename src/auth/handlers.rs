//! Authentication handlers

use axum::{extract::Extension, http::StatusCode, Json};
use serde_json::json;
use tracing::{info, warn};

use super::extractors::AuthedUser;
use super::models::{AuthSession, LoginRequest, RegisterRequest, Role};
use crate::common::validation::is_valid_email;
use crate::common::{safe_email_log, ApiError, ApiJson, SharedState, ValidationResult};

const MIN_PASSWORD_LENGTH: usize = 8;

/// POST /auth/register
///
/// Self-service sign-up; the role defaults to `doctor`. A self-registered
/// patient has no patient profile, so patient endpoints answer 404
/// "Patient profile not found" for it.
///
/// # Request Body
/// ```json
/// { "email": "...", "password": "...", "full_name": "...", "role": "doctor" }
/// ```
pub async fn register(
    Extension(state_lock): Extension<SharedState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let state = state_lock.read().await.clone();

    let mut result = ValidationResult::new();
    if !is_valid_email(payload.email.trim()) {
        result.add_error("email", "must be a valid email address");
    }
    if payload.password.chars().count() < MIN_PASSWORD_LENGTH {
        result.add_error(
            "password",
            &format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        );
    }
    result.into_result()?;

    let role = match payload.role.as_deref().map(str::trim) {
        None | Some("") => Role::Doctor,
        Some(raw) => Role::parse(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown role: {}", raw)))?,
    };

    let mut metadata = json!({ "role": role.as_str() });
    if let Some(name) = payload.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        metadata["full_name"] = json!(name);
    }

    let user = state
        .identity
        .sign_up(payload.email.trim(), &payload.password, metadata)
        .await?;
    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        role = %role,
        "User registered"
    );

    let session = state.identity.issue_session(user)?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /auth/login
pub async fn login(
    Extension(state_lock): Extension<SharedState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthSession>, ApiError> {
    let state = state_lock.read().await.clone();

    match state.identity.sign_in(&payload.email, &payload.password).await {
        Ok(session) => {
            info!(user_id = %session.user.id, "User signed in");
            Ok(Json(session))
        }
        Err(e) => {
            warn!(email = %safe_email_log(&payload.email), error = %e, "Sign-in failed");
            Err(e.into())
        }
    }
}

/// GET /auth/me
pub async fn me(user: AuthedUser) -> Json<AuthedUser> {
    Json(user)
}
