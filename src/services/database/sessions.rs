use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::{
    Database, Exercise, ExerciseSession, NewSession, PatientName, SessionChanges, SessionTotals,
    SessionWithExercise, SessionWithPatient,
};
use crate::common::generate_session_id;

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";

const SESSION_COLUMNS: &str = "id, patient_id, exercise_id, duration_seconds, repetitions, \
     notes, status, started_at, completed_at, created_at, updated_at";

#[derive(FromRow)]
struct SessionExerciseRow {
    #[sqlx(flatten)]
    session: ExerciseSession,
    ex_name: Option<String>,
    ex_description: Option<String>,
    ex_category: Option<String>,
    ex_difficulty: Option<String>,
    ex_instructions: Option<String>,
    ex_video_url: Option<String>,
    ex_created_at: Option<String>,
}

#[derive(FromRow)]
struct SessionPatientRow {
    #[sqlx(flatten)]
    session: ExerciseSession,
    patient_full_name: String,
}

impl Database {
    pub async fn insert_session(&self, session: &NewSession) -> Result<ExerciseSession, sqlx::Error> {
        let id = generate_session_id();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO exercise_sessions (
                id, patient_id, exercise_id, duration_seconds, repetitions, notes, status,
                started_at, completed_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&session.patient_id)
        .bind(&session.exercise_id)
        .bind(session.duration_seconds)
        .bind(session.repetitions)
        .bind(&session.notes)
        .bind(&session.status)
        .bind(&now)
        .bind((session.status == STATUS_COMPLETED).then(|| now.clone()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_session_for_patient(&id, &session.patient_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_session_for_patient(
        &self,
        session_id: &str,
        patient_id: &str,
    ) -> Result<Option<ExerciseSession>, sqlx::Error> {
        sqlx::query_as::<_, ExerciseSession>(&format!(
            "SELECT {} FROM exercise_sessions WHERE id = ? AND patient_id = ?",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// One of the patient's sessions with its exercise nested
    pub async fn find_session_with_exercise(
        &self,
        session_id: &str,
        patient_id: &str,
    ) -> Result<Option<SessionWithExercise>, sqlx::Error> {
        let row = sqlx::query_as::<_, SessionExerciseRow>(
            r#"
            SELECT s.id, s.patient_id, s.exercise_id, s.duration_seconds, s.repetitions,
                   s.notes, s.status, s.started_at, s.completed_at, s.created_at, s.updated_at,
                   e.name AS ex_name, e.description AS ex_description,
                   e.category AS ex_category, e.difficulty AS ex_difficulty,
                   e.instructions AS ex_instructions, e.video_url AS ex_video_url,
                   e.created_at AS ex_created_at
            FROM exercise_sessions s
            LEFT JOIN exercises e ON e.id = s.exercise_id
            WHERE s.id = ? AND s.patient_id = ?
            "#,
        )
        .bind(session_id)
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let exercises = match (row.ex_name, row.ex_created_at) {
                (Some(name), Some(created_at)) => Some(Exercise {
                    id: row.session.exercise_id.clone(),
                    name,
                    description: row.ex_description,
                    category: row.ex_category,
                    difficulty: row.ex_difficulty,
                    instructions: row.ex_instructions,
                    video_url: row.ex_video_url,
                    created_at,
                }),
                _ => None,
            };
            SessionWithExercise {
                session: row.session,
                exercises,
            }
        }))
    }

    /// Applies a partial update to one of the patient's sessions.
    ///
    /// Moving to `completed` stamps `completed_at` only if it is still
    /// empty, so repeating the same update leaves the row unchanged apart
    /// from `updated_at`. Any other status clears it. Returns `None` when
    /// the session is not the patient's.
    pub async fn update_session(
        &self,
        session_id: &str,
        patient_id: &str,
        changes: &SessionChanges,
    ) -> Result<Option<ExerciseSession>, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE exercise_sessions SET updated_at = ");
        query.push_bind(&now);

        if let Some(duration) = changes.duration_seconds {
            query.push(", duration_seconds = ").push_bind(duration);
        }
        if let Some(repetitions) = changes.repetitions {
            query.push(", repetitions = ").push_bind(repetitions);
        }
        if let Some(notes) = &changes.notes {
            query.push(", notes = ").push_bind(notes.clone());
        }
        if let Some(status) = &changes.status {
            query.push(", status = ").push_bind(status.clone());
            if status == STATUS_COMPLETED {
                query
                    .push(", completed_at = COALESCE(completed_at, ")
                    .push_bind(&now)
                    .push(")");
            } else {
                query.push(", completed_at = NULL");
            }
        }

        query
            .push(" WHERE id = ")
            .push_bind(session_id)
            .push(" AND patient_id = ")
            .push_bind(patient_id);

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_session_for_patient(session_id, patient_id).await
    }

    /// Sessions of one patient, newest first
    pub async fn list_sessions_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<ExerciseSession>, sqlx::Error> {
        sqlx::query_as::<_, ExerciseSession>(&format!(
            "SELECT {} FROM exercise_sessions WHERE patient_id = ? \
             ORDER BY created_at DESC, rowid DESC",
            SESSION_COLUMNS
        ))
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_sessions_for_patient(
        &self,
        patient_id: &str,
        status: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM exercise_sessions WHERE patient_id = ? AND status = ?",
                )
                .bind(patient_id)
                .bind(status)
                .fetch_one(&self.pool)
                .await
            }
            None => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM exercise_sessions WHERE patient_id = ?",
                )
                .bind(patient_id)
                .fetch_one(&self.pool)
                .await
            }
        }
    }

    /// Most recent sessions across all of a doctor's patients
    pub async fn recent_sessions_for_doctor(
        &self,
        doctor_id: &str,
        limit: i64,
    ) -> Result<Vec<SessionWithPatient>, sqlx::Error> {
        let rows = sqlx::query_as::<_, SessionPatientRow>(
            r#"
            SELECT s.id, s.patient_id, s.exercise_id, s.duration_seconds, s.repetitions,
                   s.notes, s.status, s.started_at, s.completed_at, s.created_at, s.updated_at,
                   p.full_name AS patient_full_name
            FROM exercise_sessions s
            JOIN patients p ON p.id = s.patient_id
            WHERE p.doctor_id = ?
            ORDER BY s.created_at DESC, s.rowid DESC
            LIMIT ?
            "#,
        )
        .bind(doctor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SessionWithPatient {
                session: row.session,
                patients: PatientName {
                    full_name: row.patient_full_name,
                },
            })
            .collect())
    }

    pub async fn session_totals_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<SessionTotals, sqlx::Error> {
        sqlx::query_as::<_, SessionTotals>(
            r#"
            SELECT COUNT(*) AS total_sessions,
                   COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed_sessions,
                   COALESCE(SUM(duration_seconds), 0) AS total_duration,
                   COALESCE(SUM(repetitions), 0) AS total_repetitions,
                   MAX(created_at) AS last_session
            FROM exercise_sessions
            WHERE patient_id = ?
            "#,
        )
        .bind(patient_id)
        .fetch_one(&self.pool)
        .await
    }
}
