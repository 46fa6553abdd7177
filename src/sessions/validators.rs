use super::models::{CreateSessionPayload, UpdateSessionPayload, ALLOWED_STATUSES};
use crate::common::{ValidationResult, Validator};
use crate::services::database::SessionChanges;

fn check_status(result: &mut ValidationResult, status: Option<&str>) {
    if let Some(status) = status {
        if !ALLOWED_STATUSES.contains(&status) {
            result.add_error(
                "status",
                &format!("must be one of: {}", ALLOWED_STATUSES.join(", ")),
            );
        }
    }
}

fn check_non_negative(result: &mut ValidationResult, field: &str, value: Option<i64>) {
    if matches!(value, Some(v) if v < 0) {
        result.add_error(field, "must not be negative");
    }
}

pub struct SessionValidator;

impl Validator<CreateSessionPayload> for SessionValidator {
    fn validate(&self, data: &CreateSessionPayload) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.exercise_id.trim().is_empty() {
            result.add_error("exercise_id", "is required");
        }
        check_non_negative(&mut result, "duration_seconds", data.duration_seconds);
        check_non_negative(&mut result, "repetitions", data.repetitions);
        check_status(&mut result, data.status.as_deref());

        result
    }
}

impl Validator<UpdateSessionPayload> for SessionValidator {
    fn validate(&self, data: &UpdateSessionPayload) -> ValidationResult {
        let mut result = ValidationResult::new();

        if SessionChanges::from(data.clone()).is_empty() {
            result.add_error("body", "at least one field must be provided");
        }
        check_non_negative(&mut result, "duration_seconds", data.duration_seconds);
        check_non_negative(&mut result, "repetitions", data.repetitions);
        check_status(&mut result, data.status.as_deref());

        result
    }
}
