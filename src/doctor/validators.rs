use super::models::{AssignExercisePayload, CreatePatientPayload};
use crate::common::validation::is_valid_email;
use crate::common::{ValidationResult, Validator};

const MAX_AGE: i64 = 150;

pub struct PatientValidator;

impl Validator<CreatePatientPayload> for PatientValidator {
    fn validate(&self, data: &CreatePatientPayload) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !is_valid_email(data.email.trim()) {
            result.add_error("email", "must be a valid email address");
        }
        result.require_text("full_name", &data.full_name, 200);
        result.require_text("phone", &data.phone, 50);

        if let Some(age) = data.age {
            if !(0..=MAX_AGE).contains(&age) {
                result.add_error("age", &format!("must be between 0 and {}", MAX_AGE));
            }
        }

        if let Some(notes) = &data.notes {
            if notes.chars().count() > 5000 {
                result.add_error("notes", "must be at most 5000 characters");
            }
        }

        result
    }
}

pub struct AssignmentValidator;

impl Validator<AssignExercisePayload> for AssignmentValidator {
    fn validate(&self, data: &AssignExercisePayload) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.patient_ids.is_empty() {
            result.add_error("patient_ids", "No patients selected");
        }
        if data.exercise_id.trim().is_empty() {
            result.add_error("exercise_id", "is required");
        }
        if data.sets <= 0 {
            result.add_error("sets", "must be positive");
        }
        if data.reps <= 0 {
            result.add_error("reps", "must be positive");
        }
        result.require_text("frequency", &data.frequency, 100);

        result
    }
}
