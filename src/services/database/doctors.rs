use super::{Database, Doctor};
use crate::common::generate_doctor_id;

impl Database {
    pub async fn find_doctor_by_auth_user(
        &self,
        auth_user_id: &str,
    ) -> Result<Option<Doctor>, sqlx::Error> {
        sqlx::query_as::<_, Doctor>(
            "SELECT id, auth_user_id, email, created_at FROM doctors WHERE auth_user_id = ?",
        )
        .bind(auth_user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Returns the doctor row for an identity, creating it on first access.
    ///
    /// The insert is a no-op when a row already exists (unique
    /// `auth_user_id`), so concurrent first requests converge on one row.
    pub async fn get_or_create_doctor(
        &self,
        auth_user_id: &str,
        email: &str,
    ) -> Result<Doctor, sqlx::Error> {
        if let Some(doctor) = self.find_doctor_by_auth_user(auth_user_id).await? {
            return Ok(doctor);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO doctors (id, auth_user_id, email, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(auth_user_id) DO NOTHING
            "#,
        )
        .bind(generate_doctor_id())
        .bind(auth_user_id)
        .bind(email)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            tracing::info!(auth_user_id = %auth_user_id, "Created missing doctor profile");
        }

        self.find_doctor_by_auth_user(auth_user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
