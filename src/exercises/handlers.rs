use axum::{extract::Extension, Json};

use crate::auth::AuthedUser;
use crate::common::{ApiError, SharedState};
use crate::services::database::Exercise;

/// GET /exercises - The exercise catalog, by name
pub async fn list_exercises(
    Extension(state_lock): Extension<SharedState>,
    _user: AuthedUser,
) -> Result<Json<Vec<Exercise>>, ApiError> {
    let state = state_lock.read().await.clone();
    let exercises = state
        .db
        .list_exercises()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch exercises", e))?;
    Ok(Json(exercises))
}
