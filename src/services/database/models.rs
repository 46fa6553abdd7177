//! Row types returned by the persistence gateway
//!
//! Joined reads nest the related row under the related table's name
//! (`exercises`, `patients`) so API consumers see the same shape the
//! hosted datastore produced.

use serde::Serialize;
use sqlx::FromRow;

use crate::common::helpers::serialize_string_list;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Doctor {
    pub id: String,
    pub auth_user_id: String,
    pub email: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Patient {
    pub id: String,
    pub doctor_id: String,
    pub auth_user_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<String>,
    pub age: Option<i64>,
    #[serde(serialize_with = "serialize_string_list")]
    pub conditions: String,
    #[serde(serialize_with = "serialize_string_list")]
    pub allergies: String,
    #[serde(serialize_with = "serialize_string_list")]
    pub medications: String,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Everything needed to insert a patient row
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub doctor_id: String,
    pub auth_user_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<String>,
    pub age: Option<i64>,
    pub conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub instructions: Option<String>,
    pub video_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AssignedExercise {
    pub id: String,
    pub patient_id: String,
    pub exercise_id: String,
    pub sets: i64,
    pub reps: i64,
    pub frequency: String,
    pub notes: Option<String>,
    pub assigned_at: String,
}

/// Prescription shared by every row of a bulk assignment
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub exercise_id: String,
    pub sets: i64,
    pub reps: i64,
    pub frequency: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignedExerciseWithExercise {
    #[serde(flatten)]
    pub assignment: AssignedExercise,
    pub exercises: Option<Exercise>,
}

/// Flat row of `assigned_exercises LEFT JOIN exercises`
#[derive(Debug, FromRow)]
pub(crate) struct AssignmentJoinRow {
    pub id: String,
    pub patient_id: String,
    pub exercise_id: String,
    pub sets: i64,
    pub reps: i64,
    pub frequency: String,
    pub notes: Option<String>,
    pub assigned_at: String,
    pub ex_name: Option<String>,
    pub ex_description: Option<String>,
    pub ex_category: Option<String>,
    pub ex_difficulty: Option<String>,
    pub ex_instructions: Option<String>,
    pub ex_video_url: Option<String>,
    pub ex_created_at: Option<String>,
}

impl From<AssignmentJoinRow> for AssignedExerciseWithExercise {
    fn from(row: AssignmentJoinRow) -> Self {
        let exercises = match (row.ex_name, row.ex_created_at) {
            (Some(name), Some(created_at)) => Some(Exercise {
                id: row.exercise_id.clone(),
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

        Self {
            assignment: AssignedExercise {
                id: row.id,
                patient_id: row.patient_id,
                exercise_id: row.exercise_id,
                sets: row.sets,
                reps: row.reps,
                frequency: row.frequency,
                notes: row.notes,
                assigned_at: row.assigned_at,
            },
            exercises,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExerciseSession {
    pub id: String,
    pub patient_id: String,
    pub exercise_id: String,
    pub duration_seconds: i64,
    pub repetitions: i64,
    pub notes: Option<String>,
    pub status: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub patient_id: String,
    pub exercise_id: String,
    pub duration_seconds: i64,
    pub repetitions: i64,
    pub notes: Option<String>,
    pub status: String,
}

/// Partial session update; `None` leaves a column untouched and
/// `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default)]
pub struct SessionChanges {
    pub duration_seconds: Option<i64>,
    pub repetitions: Option<i64>,
    pub notes: Option<Option<String>>,
    pub status: Option<String>,
}

impl SessionChanges {
    pub fn is_empty(&self) -> bool {
        self.duration_seconds.is_none()
            && self.repetitions.is_none()
            && self.notes.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionWithExercise {
    #[serde(flatten)]
    pub session: ExerciseSession,
    pub exercises: Option<Exercise>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientName {
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionWithPatient {
    #[serde(flatten)]
    pub session: ExerciseSession,
    pub patients: PatientName,
}

/// Aggregates over one patient's sessions
#[derive(Debug, Clone, Default, FromRow)]
pub struct SessionTotals {
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub total_duration: i64,
    pub total_repetitions: i64,
    pub last_session: Option<String>,
}

/// Identity account with role `patient` that has no patient row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrphanedAccount {
    pub id: String,
    pub email: String,
    pub created_at: String,
}
