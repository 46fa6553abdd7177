use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatientPayload {
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub date_of_birth: Option<String>,
    pub age: Option<i64>,
    pub conditions: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "sendCredentials", default = "default_true")]
    pub send_credentials: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignExercisePayload {
    pub exercise_id: String,
    pub patient_ids: Vec<String>,
    pub sets: i64,
    pub reps: i64,
    pub frequency: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePatientResponse {
    pub status: &'static str,
    pub patient_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_patients: i64,
    pub total_patients: i64,
}

/// Session totals for one patient
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub total_duration: i64,
    pub total_repetitions: i64,
    pub last_session: Option<String>,
}
