use serde::Deserialize;

use crate::common::helpers::nullable_field;
use crate::services::database::SessionChanges;

pub const ALLOWED_STATUSES: [&str; 4] = ["in_progress", "paused", "completed", "cancelled"];

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionPayload {
    pub exercise_id: String,
    pub duration_seconds: Option<i64>,
    pub repetitions: Option<i64>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

/// PATCH body; absent fields are left untouched and `"notes": null` clears notes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSessionPayload {
    pub duration_seconds: Option<i64>,
    pub repetitions: Option<i64>,
    #[serde(default, deserialize_with = "nullable_field")]
    pub notes: Option<Option<String>>,
    pub status: Option<String>,
}

impl From<UpdateSessionPayload> for SessionChanges {
    fn from(payload: UpdateSessionPayload) -> Self {
        SessionChanges {
            duration_seconds: payload.duration_seconds,
            repetitions: payload.repetitions,
            notes: payload.notes,
            status: payload.status,
        }
    }
}
