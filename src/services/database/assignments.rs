use super::models::AssignmentJoinRow;
use super::{AssignedExercise, AssignedExerciseWithExercise, Database, NewAssignment};
use crate::common::generate_assignment_id;

impl Database {
    /// Inserts one assignment row per patient, all or nothing.
    pub async fn insert_assignments(
        &self,
        assignment: &NewAssignment,
        patient_ids: &[String],
    ) -> Result<Vec<AssignedExercise>, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(patient_ids.len());

        for patient_id in patient_ids {
            let row = AssignedExercise {
                id: generate_assignment_id(),
                patient_id: patient_id.clone(),
                exercise_id: assignment.exercise_id.clone(),
                sets: assignment.sets,
                reps: assignment.reps,
                frequency: assignment.frequency.clone(),
                notes: assignment.notes.clone(),
                assigned_at: now.clone(),
            };

            sqlx::query(
                r#"
                INSERT INTO assigned_exercises
                    (id, patient_id, exercise_id, sets, reps, frequency, notes, assigned_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.id)
            .bind(&row.patient_id)
            .bind(&row.exercise_id)
            .bind(row.sets)
            .bind(row.reps)
            .bind(&row.frequency)
            .bind(&row.notes)
            .bind(&row.assigned_at)
            .execute(&mut *tx)
            .await?;

            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Assignments of one patient with the exercise nested, newest first
    pub async fn list_assignments_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<AssignedExerciseWithExercise>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AssignmentJoinRow>(
            r#"
            SELECT a.id, a.patient_id, a.exercise_id, a.sets, a.reps, a.frequency, a.notes,
                   a.assigned_at,
                   e.name AS ex_name, e.description AS ex_description,
                   e.category AS ex_category, e.difficulty AS ex_difficulty,
                   e.instructions AS ex_instructions, e.video_url AS ex_video_url,
                   e.created_at AS ex_created_at
            FROM assigned_exercises a
            LEFT JOIN exercises e ON e.id = a.exercise_id
            WHERE a.patient_id = ?
            ORDER BY a.assigned_at DESC, a.rowid DESC
            "#,
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn count_assignments_for_patient(&self, patient_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assigned_exercises WHERE patient_id = ?")
            .bind(patient_id)
            .fetch_one(&self.pool)
            .await
    }
}
