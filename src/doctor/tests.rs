//! Tests for the doctor module
//!
//! Handlers are called directly with a resolved caller, against an
//! in-memory database.

use axum::extract::Path;
use axum::http::StatusCode;

use super::handlers;
use super::models::{AssignExercisePayload, CreatePatientPayload};
use super::validators::{AssignmentValidator, PatientValidator};
use crate::auth::{AuthedUser, Role};
use crate::common::{ApiError, ApiJson, Validator};
use crate::test_support::{first_exercise_id, response_json, TestApp};

fn patient_payload(email: &str, full_name: &str) -> CreatePatientPayload {
    CreatePatientPayload {
        email: email.to_string(),
        full_name: full_name.to_string(),
        phone: "555-123-4567".to_string(),
        date_of_birth: Some("1980-04-02".to_string()),
        age: Some(44),
        conditions: Some(vec!["knee pain".to_string()]),
        allergies: None,
        medications: Some(vec!["ibuprofen".to_string()]),
        emergency_contact_name: None,
        emergency_contact_phone: None,
        notes: None,
        send_credentials: true,
    }
}

fn assignment(exercise_id: &str, patient_ids: Vec<String>) -> AssignExercisePayload {
    AssignExercisePayload {
        exercise_id: exercise_id.to_string(),
        patient_ids,
        sets: 3,
        reps: 10,
        frequency: "daily".to_string(),
        notes: None,
    }
}

async fn create_patient(app: &TestApp, doctor: &AuthedUser, email: &str, name: &str) -> String {
    let response = handlers::create_patient(
        app.extension(),
        doctor.clone(),
        ApiJson(patient_payload(email, name)),
    )
    .await
    .unwrap();
    response.0.patient_id.clone()
}

#[test]
fn test_patient_validator() {
    let mut payload = patient_payload("not-an-email", "  ");
    payload.age = Some(-1);
    let result = PatientValidator.validate(&payload);
    assert!(!result.is_valid);
    let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["email", "full_name", "age"]);

    assert!(PatientValidator
        .validate(&patient_payload("maria@example.com", "Maria Garcia"))
        .is_valid);
}

#[test]
fn test_assignment_validator() {
    let mut payload = assignment("E_1", Vec::new());
    payload.sets = 0;
    let result = AssignmentValidator.validate(&payload);
    let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["patient_ids", "sets"]);
}

#[test]
fn test_send_credentials_defaults_to_true() {
    let payload: CreatePatientPayload = serde_json::from_value(serde_json::json!({
        "email": "maria@example.com",
        "full_name": "Maria Garcia",
        "phone": "555-123-4567"
    }))
    .unwrap();
    assert!(payload.send_credentials);

    let payload: CreatePatientPayload = serde_json::from_value(serde_json::json!({
        "email": "maria@example.com",
        "full_name": "Maria Garcia",
        "phone": "555-123-4567",
        "sendCredentials": false
    }))
    .unwrap();
    assert!(!payload.send_credentials);
}

#[tokio::test]
async fn test_patient_role_is_forbidden() {
    let app = TestApp::new().await;
    let patient = app.user("p@example.com", Role::Patient).await;

    let err = handlers::list_patients(app.extension(), patient.clone())
        .await
        .err()
        .unwrap();
    match err {
        ApiError::Forbidden(reason) => assert_eq!(reason, "Only doctors can view patient list"),
        other => panic!("unexpected error: {:?}", other),
    }

    let err = handlers::dashboard_stats(app.extension(), patient).await.err().unwrap();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_patient_emails_credentials() {
    let app = TestApp::new().await;
    let doctor = app.user("doc@clinic.test", Role::Doctor).await;

    let patient_id = create_patient(&app, &doctor, "Maria@Example.com", "Maria Garcia").await;

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "maria@example.com");
    assert!(sent[0].html_body.contains("Maria4567"));

    // The temporary password works for sign-in and the account is a patient
    let session = app.identity.sign_in("maria@example.com", "Maria4567").await.unwrap();
    assert_eq!(session.user.role, Some(Role::Patient));

    let profile = app
        .db
        .find_patient_by_auth_user(&session.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.id, patient_id);
}

#[tokio::test]
async fn test_create_patient_without_email() {
    let app = TestApp::new().await;
    let doctor = app.user("doc@clinic.test", Role::Doctor).await;
    let mut payload = patient_payload("maria@example.com", "Maria Garcia");
    payload.send_credentials = false;

    let response = handlers::create_patient(app.extension(), doctor, ApiJson(payload))
        .await
        .unwrap();
    assert_eq!(response.0.status, "success");
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_email_failure_does_not_fail_creation() {
    let app = TestApp::with_failing_mailer().await;
    let doctor = app.user("doc@clinic.test", Role::Doctor).await;

    let response = handlers::create_patient(
        app.extension(),
        doctor,
        ApiJson(patient_payload("maria@example.com", "Maria Garcia")),
    )
    .await
    .unwrap();
    assert_eq!(response.0.status, "success");
    assert_eq!(response.0.message, "Patient created successfully");
}

#[tokio::test]
async fn test_duplicate_email_is_bad_request() {
    let app = TestApp::new().await;
    let doctor = app.user("doc@clinic.test", Role::Doctor).await;
    create_patient(&app, &doctor, "maria@example.com", "Maria Garcia").await;

    let err = handlers::create_patient(
        app.extension(),
        doctor,
        ApiJson(patient_payload("maria@example.com", "Maria Again")),
    )
    .await
    .err()
    .unwrap();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_profile_insert_removes_account() {
    let app = TestApp::new().await;
    let doctor = app.user("doc@clinic.test", Role::Doctor).await;
    // Resolve the doctor row first, then break the patients table
    app.db.get_or_create_doctor(&doctor.id, &doctor.email).await.unwrap();
    sqlx::query("DROP TABLE patients").execute(app.db.pool()).await.unwrap();

    let err = handlers::create_patient(
        app.extension(),
        doctor,
        ApiJson(patient_payload("maria@example.com", "Maria Garcia")),
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, ApiError::InternalServer(_)));

    let accounts: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM auth_users WHERE email = 'maria@example.com'")
            .fetch_one(app.db.pool())
            .await
            .unwrap();
    assert_eq!(accounts, 0);
}

#[tokio::test]
async fn test_undeletable_account_is_reported_as_orphaned() {
    let app = TestApp::with_undeletable_accounts().await;
    let doctor = app.user("doc@clinic.test", Role::Doctor).await;
    app.db.get_or_create_doctor(&doctor.id, &doctor.email).await.unwrap();
    sqlx::query("DROP TABLE assigned_exercises").execute(app.db.pool()).await.unwrap();
    sqlx::query("DROP TABLE exercise_sessions").execute(app.db.pool()).await.unwrap();
    sqlx::query("DROP TABLE patients").execute(app.db.pool()).await.unwrap();

    let err = handlers::create_patient(
        app.extension(),
        doctor,
        ApiJson(patient_payload("maria@example.com", "Maria Garcia")),
    )
    .await
    .err()
    .unwrap();
    let (status, body) = response_json(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().starts_with("ORPHANED_ACCOUNT"));
}

#[tokio::test]
async fn test_doctors_only_see_their_own_patients() {
    let app = TestApp::new().await;
    let d1 = app.user("d1@clinic.test", Role::Doctor).await;
    let d2 = app.user("d2@clinic.test", Role::Doctor).await;
    let patient_id = create_patient(&app, &d1, "maria@example.com", "Maria Garcia").await;

    let (_, list) = response_json(
        handlers::list_patients(app.extension(), d1.clone()).await.unwrap(),
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["conditions"], serde_json::json!(["knee pain"]));

    let (_, other_list) = response_json(
        handlers::list_patients(app.extension(), d2.clone()).await.unwrap(),
    )
    .await;
    assert!(other_list.as_array().unwrap().is_empty());

    let err = handlers::get_patient(app.extension(), d2.clone(), Path(patient_id.clone()))
        .await
        .err()
        .unwrap();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

    let err = handlers::patient_stats(app.extension(), d2, Path(patient_id.clone()))
        .await
        .err()
        .unwrap();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

    let (status, patient) = response_json(
        handlers::get_patient(app.extension(), d1, Path(patient_id.clone()))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patient["id"], serde_json::json!(patient_id));
}

#[tokio::test]
async fn test_dashboard_stats_counts_patients() {
    let app = TestApp::new().await;
    let doctor = app.user("doc@clinic.test", Role::Doctor).await;

    let (_, empty) = response_json(
        handlers::dashboard_stats(app.extension(), doctor.clone()).await.unwrap(),
    )
    .await;
    assert_eq!(empty, serde_json::json!({"activePatients": 0, "totalPatients": 0}));

    create_patient(&app, &doctor, "maria@example.com", "Maria Garcia").await;
    let (_, stats) = response_json(
        handlers::dashboard_stats(app.extension(), doctor).await.unwrap(),
    )
    .await;
    assert_eq!(stats, serde_json::json!({"activePatients": 1, "totalPatients": 1}));
}

#[tokio::test]
async fn test_dashboard_stats_degrade_to_zero() {
    let app = TestApp::new().await;
    let doctor = app.user("doc@clinic.test", Role::Doctor).await;
    sqlx::query("DROP TABLE assigned_exercises").execute(app.db.pool()).await.unwrap();
    sqlx::query("DROP TABLE exercise_sessions").execute(app.db.pool()).await.unwrap();
    sqlx::query("DROP TABLE patients").execute(app.db.pool()).await.unwrap();

    let (status, stats) = response_json(
        handlers::dashboard_stats(app.extension(), doctor.clone()).await.unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, serde_json::json!({"activePatients": 0, "totalPatients": 0}));

    let (_, sessions) = response_json(
        handlers::active_sessions(app.extension(), doctor).await.unwrap(),
    )
    .await;
    assert_eq!(sessions, serde_json::json!([]));
}

#[tokio::test]
async fn test_assign_exercise_to_own_patients() {
    let app = TestApp::new().await;
    let doctor = app.user("doc@clinic.test", Role::Doctor).await;
    let p1 = create_patient(&app, &doctor, "maria@example.com", "Maria Garcia").await;
    let p2 = create_patient(&app, &doctor, "john@example.com", "John Smith").await;
    let exercise_id = first_exercise_id(&app.db).await;

    let response = handlers::assign_exercise(
        app.extension(),
        doctor.clone(),
        ApiJson(assignment(&exercise_id, vec![p1.clone(), p2.clone(), p1.clone()])),
    )
    .await
    .unwrap();
    assert_eq!(response.0.message, "Assigned to 2 patients");

    let (_, exercises) = response_json(
        handlers::patient_exercises(app.extension(), doctor, Path(p1))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(exercises.as_array().unwrap().len(), 1);
    assert_eq!(exercises[0]["exercises"]["id"], serde_json::json!(exercise_id));
}

#[tokio::test]
async fn test_assign_exercise_rejections() {
    let app = TestApp::new().await;
    let d1 = app.user("d1@clinic.test", Role::Doctor).await;
    let d2 = app.user("d2@clinic.test", Role::Doctor).await;
    let mine = create_patient(&app, &d1, "maria@example.com", "Maria Garcia").await;
    let theirs = create_patient(&app, &d2, "john@example.com", "John Smith").await;
    let exercise_id = first_exercise_id(&app.db).await;

    let empty = handlers::assign_exercise(
        app.extension(),
        d1.clone(),
        ApiJson(assignment(&exercise_id, Vec::new())),
    )
    .await
    .err()
    .unwrap();
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);

    let missing_exercise = handlers::assign_exercise(
        app.extension(),
        d1.clone(),
        ApiJson(assignment("E_MISSING", vec![mine.clone()])),
    )
    .await
    .err()
    .unwrap();
    assert_eq!(missing_exercise.status_code(), StatusCode::NOT_FOUND);

    let foreign = handlers::assign_exercise(
        app.extension(),
        d1,
        ApiJson(assignment(&exercise_id, vec![mine.clone(), theirs.clone()])),
    )
    .await
    .err()
    .unwrap();
    assert_eq!(foreign.status_code(), StatusCode::NOT_FOUND);

    assert_eq!(app.db.count_assignments_for_patient(&mine).await.unwrap(), 0);
    assert_eq!(app.db.count_assignments_for_patient(&theirs).await.unwrap(), 0);
}

#[tokio::test]
async fn test_patient_stats_from_sessions() {
    let app = TestApp::new().await;
    let doctor = app.user("doc@clinic.test", Role::Doctor).await;
    let patient_id = create_patient(&app, &doctor, "maria@example.com", "Maria Garcia").await;

    let (_, stats) = response_json(
        handlers::patient_stats(app.extension(), doctor, Path(patient_id))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(
        stats,
        serde_json::json!({
            "totalSessions": 0,
            "completedSessions": 0,
            "totalDuration": 0,
            "totalRepetitions": 0,
            "lastSession": null
        })
    );
}
