//! Doctor-facing handlers
//!
//! Every handler checks the caller's role first, then resolves the caller's
//! doctor row (creating it on first access) and scopes every query by its id.

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{error, info, warn};

use super::models::{
    AssignExercisePayload, CreatePatientPayload, CreatePatientResponse, DashboardStats,
    MessageResponse, PatientStats,
};
use super::password::temporary_password;
use super::validators::{AssignmentValidator, PatientValidator};
use crate::auth::{AuthedUser, IdentityError, Role};
use crate::common::{safe_email_log, ApiError, ApiJson, AppState, SharedState, Validator};
use crate::services::database::{Doctor, NewAssignment, NewPatient, Patient, SessionWithPatient};
use crate::services::email::{generate_credentials_email, CredentialsEmailData};

const ACTIVE_SESSION_LIMIT: i64 = 20;

async fn current_doctor(state: &AppState, user: &AuthedUser) -> Result<Doctor, ApiError> {
    state
        .db
        .get_or_create_doctor(&user.id, &user.email)
        .await
        .map_err(|e| ApiError::internal("Failed to resolve doctor profile", e))
}

async fn owned_patient(
    state: &AppState,
    doctor: &Doctor,
    patient_id: &str,
) -> Result<Patient, ApiError> {
    state
        .db
        .find_patient_for_doctor(patient_id, &doctor.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch patient details", e))?
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))
}

/// GET /doctor/dashboard/stats
///
/// Anything past the role check degrades to zero counts.
pub async fn dashboard_stats(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
) -> Result<Json<DashboardStats>, ApiError> {
    user.require_role(Role::Doctor, "Only doctors can view stats")?;
    let state = state_lock.read().await.clone();

    let doctor = match state.db.get_or_create_doctor(&user.id, &user.email).await {
        Ok(doctor) => doctor,
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "Doctor resolution failed; returning empty stats");
            return Ok(Json(DashboardStats::default()));
        }
    };

    match state.db.count_patients_for_doctor(&doctor.id).await {
        Ok(count) => Ok(Json(DashboardStats {
            active_patients: count,
            total_patients: count,
        })),
        Err(e) => {
            warn!(doctor_id = %doctor.id, error = %e, "Patient count failed; returning empty stats");
            Ok(Json(DashboardStats::default()))
        }
    }
}

/// POST /doctor/create_patient
///
/// Creates the patient's identity account first and then the profile row.
/// A failed profile insert deletes the account again; if that also fails the
/// account is reported as orphaned.
pub async fn create_patient(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
    ApiJson(payload): ApiJson<CreatePatientPayload>,
) -> Result<Json<CreatePatientResponse>, ApiError> {
    user.require_role(Role::Doctor, "Only doctors can create patients")?;
    let state = state_lock.read().await.clone();

    let validation_result = PatientValidator.validate(&payload);
    if !validation_result.is_valid {
        warn!(
            user_id = %user.id,
            errors = ?validation_result.errors,
            "Create patient validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let doctor = current_doctor(&state, &user).await?;
    let email = payload.email.trim().to_lowercase();
    let full_name = payload.full_name.trim().to_string();
    let password = temporary_password(&full_name, &payload.phone);

    let account = state
        .identity
        .sign_up(
            &email,
            &password,
            json!({
                "role": Role::Patient.as_str(),
                "full_name": full_name,
                "doctor_id": doctor.id,
            }),
        )
        .await
        .map_err(|e| match e {
            IdentityError::EmailTaken => ApiError::BadRequest(
                "Failed to create user account. Email may already be in use.".to_string(),
            ),
            other => other.into(),
        })?;

    let new_patient = NewPatient {
        doctor_id: doctor.id.clone(),
        auth_user_id: account.id.clone(),
        full_name: full_name.clone(),
        email: email.clone(),
        phone: payload.phone.trim().to_string(),
        date_of_birth: payload.date_of_birth,
        age: payload.age,
        conditions: payload.conditions.unwrap_or_default(),
        allergies: payload.allergies.unwrap_or_default(),
        medications: payload.medications.unwrap_or_default(),
        emergency_contact_name: payload.emergency_contact_name,
        emergency_contact_phone: payload.emergency_contact_phone,
        notes: payload.notes,
    };

    let patient = match state.db.insert_patient(&new_patient).await {
        Ok(patient) => patient,
        Err(insert_err) => {
            error!(
                doctor_id = %doctor.id,
                auth_user_id = %account.id,
                error = %insert_err,
                "Failed to insert patient record; removing identity account"
            );
            return Err(match state.identity.delete_user(&account.id).await {
                Ok(()) => ApiError::InternalServer("Failed to create patient record".to_string()),
                Err(delete_err) => {
                    error!(
                        auth_user_id = %account.id,
                        email = %safe_email_log(&email),
                        error = %delete_err,
                        "Orphaned patient identity account"
                    );
                    ApiError::OrphanedAccount(format!(
                        "Patient account {} was created but its profile could not be saved",
                        account.id
                    ))
                }
            });
        }
    };

    info!(
        doctor_id = %doctor.id,
        patient_id = %patient.id,
        email = %safe_email_log(&email),
        "Patient created"
    );

    if payload.send_credentials {
        let message = generate_credentials_email(&CredentialsEmailData {
            patient_name: full_name,
            email: email.clone(),
            temporary_password: password,
            login_url: state.config.login_url.clone(),
        });
        if let Err(e) = state.mailer.send(&message).await {
            warn!(
                patient_id = %patient.id,
                email = %safe_email_log(&email),
                error = %e,
                "Failed to send credentials email"
            );
        }
    }

    Ok(Json(CreatePatientResponse {
        status: "success",
        patient_id: patient.id,
        message: "Patient created successfully".to_string(),
    }))
}

/// GET /doctor/patients
pub async fn list_patients(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
) -> Result<impl IntoResponse, ApiError> {
    user.require_role(Role::Doctor, "Only doctors can view patient list")?;
    let state = state_lock.read().await.clone();
    let doctor = current_doctor(&state, &user).await?;

    let patients = state
        .db
        .list_patients_for_doctor(&doctor.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch patients", e))?;

    Ok(Json(patients))
}

/// GET /doctor/patients/:patient_id
pub async fn get_patient(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
    Path(patient_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_role(Role::Doctor, "Only doctors can view patient details")?;
    let state = state_lock.read().await.clone();
    let doctor = current_doctor(&state, &user).await?;

    let patient = owned_patient(&state, &doctor, &patient_id).await?;
    Ok(Json(patient))
}

/// GET /doctor/patients/:patient_id/exercises
pub async fn patient_exercises(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
    Path(patient_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_role(Role::Doctor, "Only doctors can view patient exercises")?;
    let state = state_lock.read().await.clone();
    let doctor = current_doctor(&state, &user).await?;
    let patient = owned_patient(&state, &doctor, &patient_id).await?;

    let assignments = state
        .db
        .list_assignments_for_patient(&patient.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch patient exercises", e))?;

    Ok(Json(assignments))
}

/// GET /doctor/patients/:patient_id/stats
pub async fn patient_stats(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientStats>, ApiError> {
    user.require_role(Role::Doctor, "Only doctors can view patient stats")?;
    let state = state_lock.read().await.clone();
    let doctor = current_doctor(&state, &user).await?;
    let patient = owned_patient(&state, &doctor, &patient_id).await?;

    let totals = state
        .db
        .session_totals_for_patient(&patient.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch patient stats", e))?;

    Ok(Json(PatientStats {
        total_sessions: totals.total_sessions,
        completed_sessions: totals.completed_sessions,
        total_duration: totals.total_duration,
        total_repetitions: totals.total_repetitions,
        last_session: totals.last_session,
    }))
}

/// GET /doctor/sessions/active
///
/// Most recent sessions across the caller's patients; failures degrade to `[]`.
pub async fn active_sessions(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
) -> Result<Json<Vec<SessionWithPatient>>, ApiError> {
    user.require_role(Role::Doctor, "Only doctors can view sessions")?;
    let state = state_lock.read().await.clone();

    let doctor = match state.db.get_or_create_doctor(&user.id, &user.email).await {
        Ok(doctor) => doctor,
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "Doctor resolution failed; returning no sessions");
            return Ok(Json(Vec::new()));
        }
    };

    match state
        .db
        .recent_sessions_for_doctor(&doctor.id, ACTIVE_SESSION_LIMIT)
        .await
    {
        Ok(sessions) => Ok(Json(sessions)),
        Err(e) => {
            warn!(doctor_id = %doctor.id, error = %e, "Failed to fetch active sessions");
            Ok(Json(Vec::new()))
        }
    }
}

/// POST /doctor/assignments
///
/// Assigns one exercise to several patients. Every target must belong to
/// the caller, and the rows are written in a single transaction.
pub async fn assign_exercise(
    Extension(state_lock): Extension<SharedState>,
    user: AuthedUser,
    ApiJson(payload): ApiJson<AssignExercisePayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_role(Role::Doctor, "Only doctors can assign exercises")?;
    let state = state_lock.read().await.clone();

    let validation_result = AssignmentValidator.validate(&payload);
    if !validation_result.is_valid {
        warn!(
            user_id = %user.id,
            errors = ?validation_result.errors,
            "Assignment validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let doctor = current_doctor(&state, &user).await?;

    let exercise = state
        .db
        .find_exercise(&payload.exercise_id)
        .await
        .map_err(|e| ApiError::internal("Failed to assign exercises", e))?
        .ok_or_else(|| ApiError::NotFound("Exercise not found".to_string()))?;

    let mut patient_ids: Vec<String> = Vec::with_capacity(payload.patient_ids.len());
    for id in payload.patient_ids {
        if !patient_ids.contains(&id) {
            patient_ids.push(id);
        }
    }

    let owned = state
        .db
        .owned_patient_ids(&doctor.id, &patient_ids)
        .await
        .map_err(|e| ApiError::internal("Failed to assign exercises", e))?;
    if owned.len() != patient_ids.len() {
        warn!(
            doctor_id = %doctor.id,
            requested = patient_ids.len(),
            owned = owned.len(),
            "Assignment targets include patients not owned by the doctor"
        );
        return Err(ApiError::NotFound("Patient not found".to_string()));
    }

    let assignment = NewAssignment {
        exercise_id: exercise.id.clone(),
        sets: payload.sets,
        reps: payload.reps,
        frequency: payload.frequency.trim().to_string(),
        notes: payload.notes,
    };
    let inserted = state
        .db
        .insert_assignments(&assignment, &patient_ids)
        .await
        .map_err(|e| ApiError::internal("Failed to assign exercises", e))?;

    info!(
        doctor_id = %doctor.id,
        exercise_id = %exercise.id,
        count = inserted.len(),
        "Exercise assigned"
    );

    Ok(Json(MessageResponse {
        status: "success",
        message: format!("Assigned to {} patients", inserted.len()),
    }))
}
