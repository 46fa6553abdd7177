//! Patient-facing handlers
//!
//! A caller is authorized as a patient by owning a patient profile; every
//! query is then filtered by that profile's id.

use axum::{extract::Extension, response::IntoResponse, Json};
use tracing::warn;

use super::models::PatientDashboardStats;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, SharedState};
use crate::services::database::{Patient, STATUS_COMPLETED};

/// The caller's own patient profile, 404 when there is none
pub async fn current_patient(state: &AppState, user: &AuthedUser) -> Result<Patient, ApiError> {
    state
        .db
        .find_patient_by_auth_user(&user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to resolve patient profile", e))?
        .ok_or_else(|| {
            warn!(user_id = %user.id, "Patient profile not found");
            ApiError::NotFound("Patient profile not found".to_string())
        })
}

/// GET /patient/my_exercises
pub async fn my_exercises(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();
    let patient = current_patient(&state, &user).await?;

    let assignments = state
        .db
        .list_assignments_for_patient(&patient.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch exercises", e))?;

    Ok(Json(assignments))
}

/// GET /patient/session/history
pub async fn session_history(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();
    let patient = current_patient(&state, &user).await?;

    let sessions = state
        .db
        .list_sessions_for_patient(&patient.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch session history", e))?;

    Ok(Json(sessions))
}

/// GET /patient/dashboard/stats
///
/// Never fails: a missing profile or a failed count yields zeros.
pub async fn dashboard_stats(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
) -> Json<PatientDashboardStats> {
    let state = state_lock.read().await.clone();

    let patient = match state.db.find_patient_by_auth_user(&user.id).await {
        Ok(Some(patient)) => patient,
        Ok(None) => return Json(PatientDashboardStats::default()),
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "Patient lookup failed; returning empty stats");
            return Json(PatientDashboardStats::default());
        }
    };

    let completed = state
        .db
        .count_sessions_for_patient(&patient.id, Some(STATUS_COMPLETED))
        .await;
    let assigned = state.db.count_assignments_for_patient(&patient.id).await;

    match (completed, assigned) {
        (Ok(completed_sessions), Ok(total_exercises)) => Json(PatientDashboardStats {
            completed_sessions,
            total_exercises,
        }),
        (Err(e), _) | (_, Err(e)) => {
            warn!(patient_id = %patient.id, error = %e, "Dashboard counts failed; returning empty stats");
            Json(PatientDashboardStats::default())
        }
    }
}
