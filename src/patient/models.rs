use serde::Serialize;

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct PatientDashboardStats {
    pub completed_sessions: i64,
    pub total_exercises: i64,
}
