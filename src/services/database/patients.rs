use sqlx::{QueryBuilder, Sqlite};

use super::{Database, NewPatient, OrphanedAccount, Patient};
use crate::common::generate_patient_id;
use crate::common::helpers::encode_string_list;

const PATIENT_COLUMNS: &str = "id, doctor_id, auth_user_id, full_name, email, phone, \
     date_of_birth, age, conditions, allergies, medications, emergency_contact_name, \
     emergency_contact_phone, notes, created_at";

impl Database {
    pub async fn insert_patient(&self, patient: &NewPatient) -> Result<Patient, sqlx::Error> {
        let id = generate_patient_id();

        sqlx::query(
            r#"
            INSERT INTO patients (
                id, doctor_id, auth_user_id, full_name, email, phone, date_of_birth, age,
                conditions, allergies, medications, emergency_contact_name,
                emergency_contact_phone, notes, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&patient.doctor_id)
        .bind(&patient.auth_user_id)
        .bind(&patient.full_name)
        .bind(&patient.email)
        .bind(&patient.phone)
        .bind(&patient.date_of_birth)
        .bind(patient.age)
        .bind(encode_string_list(&patient.conditions))
        .bind(encode_string_list(&patient.allergies))
        .bind(encode_string_list(&patient.medications))
        .bind(&patient.emergency_contact_name)
        .bind(&patient.emergency_contact_phone)
        .bind(&patient.notes)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, Patient>(&format!(
            "SELECT {} FROM patients WHERE id = ?",
            PATIENT_COLUMNS
        ))
        .bind(&id)
        .fetch_one(&self.pool)
        .await
    }

    /// Patients owned by a doctor, newest first
    pub async fn list_patients_for_doctor(
        &self,
        doctor_id: &str,
    ) -> Result<Vec<Patient>, sqlx::Error> {
        sqlx::query_as::<_, Patient>(&format!(
            "SELECT {} FROM patients WHERE doctor_id = ? ORDER BY created_at DESC, rowid DESC",
            PATIENT_COLUMNS
        ))
        .bind(doctor_id)
        .fetch_all(&self.pool)
        .await
    }

    /// A patient only if it belongs to `doctor_id`
    pub async fn find_patient_for_doctor(
        &self,
        patient_id: &str,
        doctor_id: &str,
    ) -> Result<Option<Patient>, sqlx::Error> {
        sqlx::query_as::<_, Patient>(&format!(
            "SELECT {} FROM patients WHERE id = ? AND doctor_id = ?",
            PATIENT_COLUMNS
        ))
        .bind(patient_id)
        .bind(doctor_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_patient_by_auth_user(
        &self,
        auth_user_id: &str,
    ) -> Result<Option<Patient>, sqlx::Error> {
        sqlx::query_as::<_, Patient>(&format!(
            "SELECT {} FROM patients WHERE auth_user_id = ?",
            PATIENT_COLUMNS
        ))
        .bind(auth_user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Owning doctor of a patient, used to route notifications
    pub async fn find_patient_doctor_id(
        &self,
        patient_id: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT doctor_id FROM patients WHERE id = ?")
            .bind(patient_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn count_patients_for_doctor(&self, doctor_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM patients WHERE doctor_id = ?")
            .bind(doctor_id)
            .fetch_one(&self.pool)
            .await
    }

    /// The subset of `patient_ids` owned by `doctor_id`
    pub async fn owned_patient_ids(
        &self,
        doctor_id: &str,
        patient_ids: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        if patient_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id FROM patients WHERE doctor_id = ");
        query.push_bind(doctor_id);
        query.push(" AND id IN (");
        let mut separated = query.separated(", ");
        for id in patient_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        query
            .build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await
    }

    /// Reconciliation query: doctor-created patient accounts with no profile row.
    ///
    /// These are left behind when a profile insert failed and the
    /// compensating account deletion failed too. Self-registered patients
    /// carry no `doctor_id` in their metadata and are not reported.
    pub async fn orphaned_patient_accounts(&self) -> Result<Vec<OrphanedAccount>, sqlx::Error> {
        sqlx::query_as::<_, OrphanedAccount>(
            r#"
            SELECT u.id, u.email, u.created_at
            FROM auth_users u
            WHERE json_extract(u.user_metadata, '$.role') = 'patient'
              AND json_extract(u.user_metadata, '$.doctor_id') IS NOT NULL
              AND NOT EXISTS (SELECT 1 FROM patients p WHERE p.auth_user_id = u.id)
            ORDER BY u.created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
