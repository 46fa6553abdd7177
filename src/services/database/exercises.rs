use super::{Database, Exercise};

impl Database {
    pub async fn list_exercises(&self) -> Result<Vec<Exercise>, sqlx::Error> {
        sqlx::query_as::<_, Exercise>(
            r#"
            SELECT id, name, description, category, difficulty, instructions, video_url, created_at
            FROM exercises
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_exercise(&self, exercise_id: &str) -> Result<Option<Exercise>, sqlx::Error> {
        sqlx::query_as::<_, Exercise>(
            r#"
            SELECT id, name, description, category, difficulty, instructions, video_url, created_at
            FROM exercises
            WHERE id = ?
            "#,
        )
        .bind(exercise_id)
        .fetch_optional(&self.pool)
        .await
    }
}
