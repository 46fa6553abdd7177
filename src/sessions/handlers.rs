//! Exercise session handlers
//!
//! Sessions are always addressed through the caller's own patient profile,
//! so another patient's session id is indistinguishable from a missing one.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use tracing::{debug, info, warn};

use super::models::{CreateSessionPayload, UpdateSessionPayload};
use super::validators::SessionValidator;
use crate::auth::AuthedUser;
use crate::common::{ApiError, ApiJson, SharedState, Validator};
use crate::notifications::NotificationMessage;
use crate::patient::current_patient;
use crate::services::database::{
    ExerciseSession, NewSession, SessionChanges, SessionWithExercise, STATUS_IN_PROGRESS,
};

/// POST /sessions
pub async fn create_session(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
    ApiJson(payload): ApiJson<CreateSessionPayload>,
) -> Result<(StatusCode, Json<ExerciseSession>), ApiError> {
    let state = state_lock.read().await.clone();
    let patient = current_patient(&state, &user).await?;

    let validation_result = SessionValidator.validate(&payload);
    if !validation_result.is_valid {
        warn!(
            patient_id = %patient.id,
            errors = ?validation_result.errors,
            "Create session validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let exercise = state
        .db
        .find_exercise(&payload.exercise_id)
        .await
        .map_err(|e| ApiError::internal("Failed to create exercise session", e))?
        .ok_or_else(|| {
            warn!(exercise_id = %payload.exercise_id, "Exercise not found");
            ApiError::NotFound("Exercise not found".to_string())
        })?;

    let session = state
        .db
        .insert_session(&NewSession {
            patient_id: patient.id.clone(),
            exercise_id: exercise.id,
            duration_seconds: payload.duration_seconds.unwrap_or(0),
            repetitions: payload.repetitions.unwrap_or(0),
            notes: payload.notes,
            status: payload
                .status
                .unwrap_or_else(|| STATUS_IN_PROGRESS.to_string()),
        })
        .await
        .map_err(|e| ApiError::internal("Failed to create exercise session", e))?;

    info!(
        patient_id = %patient.id,
        session_id = %session.id,
        status = %session.status,
        "Exercise session created"
    );

    Ok((StatusCode::CREATED, Json(session)))
}

/// PATCH /sessions/:session_id
///
/// Every successful update is pushed to the owning doctor's live
/// connections as one `session_update` event.
pub async fn update_session(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
    Path(session_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateSessionPayload>,
) -> Result<Json<ExerciseSession>, ApiError> {
    let state = state_lock.read().await.clone();
    let patient = current_patient(&state, &user).await?;

    let validation_result = SessionValidator.validate(&payload);
    if !validation_result.is_valid {
        warn!(
            patient_id = %patient.id,
            session_id = %session_id,
            errors = ?validation_result.errors,
            "Update session validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let changes = SessionChanges::from(payload);
    let session = state
        .db
        .update_session(&session_id, &patient.id, &changes)
        .await
        .map_err(|e| ApiError::internal("Failed to update exercise session", e))?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    info!(
        patient_id = %patient.id,
        session_id = %session.id,
        status = %session.status,
        "Exercise session updated"
    );

    let data = match serde_json::to_value(&session) {
        Ok(data) => data,
        Err(e) => {
            warn!(session_id = %session.id, error = %e, "Failed to serialize session for notification");
            serde_json::Value::Null
        }
    };
    let event = NotificationMessage::SessionUpdate {
        session_id: session.id.clone(),
        status: changes.status.clone(),
        data,
    };
    let delivered = state.dispatcher.notify_doctor(&patient.id, &event).await;
    debug!(session_id = %session.id, delivered = delivered, "Session update dispatched");

    Ok(Json(session))
}

/// GET /sessions/:session_id
pub async fn get_session(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
    Path(session_id): Path<String>,
) -> Result<Json<SessionWithExercise>, ApiError> {
    let state = state_lock.read().await.clone();
    let patient = current_patient(&state, &user).await?;

    let session = state
        .db
        .find_session_with_exercise(&session_id, &patient.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch session details", e))?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    Ok(Json(session))
}
