//! Tests for the persistence gateway
//!
//! These run against a migrated in-memory SQLite database and cover the
//! scoping filters, joined reads and the idempotent writes.

use super::*;
use crate::test_support::{doctor, first_exercise_id, insert_auth_user, memory_database, patient};

fn new_session(patient_id: &str, exercise_id: &str) -> NewSession {
    NewSession {
        patient_id: patient_id.to_string(),
        exercise_id: exercise_id.to_string(),
        duration_seconds: 0,
        repetitions: 0,
        notes: None,
        status: "in_progress".to_string(),
    }
}

#[tokio::test]
async fn test_get_or_create_doctor_is_idempotent() {
    let db = memory_database().await;
    insert_auth_user(&db, "U_DOC", "doc@clinic.test", "doctor").await;

    let first = db.get_or_create_doctor("U_DOC", "doc@clinic.test").await.unwrap();
    let second = db.get_or_create_doctor("U_DOC", "doc@clinic.test").await.unwrap();
    assert_eq!(first.id, second.id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doctors")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_concurrent_get_or_create_converges() {
    let db = memory_database().await;
    insert_auth_user(&db, "U_DOC", "doc@clinic.test", "doctor").await;

    let (a, b) = tokio::join!(
        db.get_or_create_doctor("U_DOC", "doc@clinic.test"),
        db.get_or_create_doctor("U_DOC", "doc@clinic.test"),
    );
    assert_eq!(a.unwrap().id, b.unwrap().id);
}

#[tokio::test]
async fn test_patient_reads_are_scoped_to_owner() {
    let db = memory_database().await;
    let d1 = doctor(&db, "U_D1").await;
    let d2 = doctor(&db, "U_D2").await;
    let p = patient(&db, &d1, "U_P1", "Maria Garcia").await;

    assert!(db.find_patient_for_doctor(&p.id, &d1.id).await.unwrap().is_some());
    assert!(db.find_patient_for_doctor(&p.id, &d2.id).await.unwrap().is_none());
    assert_eq!(db.list_patients_for_doctor(&d1.id).await.unwrap().len(), 1);
    assert!(db.list_patients_for_doctor(&d2.id).await.unwrap().is_empty());
    assert_eq!(db.count_patients_for_doctor(&d1.id).await.unwrap(), 1);
    assert_eq!(db.count_patients_for_doctor(&d2.id).await.unwrap(), 0);
    assert_eq!(
        db.find_patient_doctor_id(&p.id).await.unwrap(),
        Some(d1.id.clone())
    );
}

#[tokio::test]
async fn test_patient_list_columns_serialize_as_arrays() {
    let db = memory_database().await;
    let d = doctor(&db, "U_D1").await;
    let p = patient(&db, &d, "U_P1", "Maria Garcia").await;

    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["conditions"], serde_json::json!(["knee pain"]));
    assert_eq!(json["allergies"], serde_json::json!([]));
}

#[tokio::test]
async fn test_owned_patient_ids_filters_foreign_patients() {
    let db = memory_database().await;
    let d1 = doctor(&db, "U_D1").await;
    let d2 = doctor(&db, "U_D2").await;
    let mine = patient(&db, &d1, "U_P1", "Maria Garcia").await;
    let theirs = patient(&db, &d2, "U_P2", "John Smith").await;

    let owned = db
        .owned_patient_ids(&d1.id, &[mine.id.clone(), theirs.id.clone(), "P_MISSING".into()])
        .await
        .unwrap();
    assert_eq!(owned, vec![mine.id]);
    assert!(db.owned_patient_ids(&d1.id, &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_assignments_nest_exercise() {
    let db = memory_database().await;
    let d = doctor(&db, "U_D1").await;
    let p1 = patient(&db, &d, "U_P1", "Maria Garcia").await;
    let p2 = patient(&db, &d, "U_P2", "John Smith").await;
    let exercise_id = first_exercise_id(&db).await;

    let inserted = db
        .insert_assignments(
            &NewAssignment {
                exercise_id: exercise_id.clone(),
                sets: 3,
                reps: 10,
                frequency: "daily".to_string(),
                notes: Some("slow and controlled".to_string()),
            },
            &[p1.id.clone(), p2.id.clone()],
        )
        .await
        .unwrap();
    assert_eq!(inserted.len(), 2);

    let listed = db.list_assignments_for_patient(&p1.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].assignment.sets, 3);
    assert_eq!(listed[0].exercises.as_ref().unwrap().id, exercise_id);

    let json = serde_json::to_value(&listed[0]).unwrap();
    assert_eq!(json["patient_id"], serde_json::json!(p1.id));
    assert!(json["exercises"]["name"].is_string());

    assert_eq!(db.count_assignments_for_patient(&p2.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_failed_bulk_assignment_inserts_nothing() {
    let db = memory_database().await;
    let d = doctor(&db, "U_D1").await;
    let p = patient(&db, &d, "U_P1", "Maria Garcia").await;
    let exercise_id = first_exercise_id(&db).await;

    let result = db
        .insert_assignments(
            &NewAssignment {
                exercise_id,
                sets: 3,
                reps: 10,
                frequency: "daily".to_string(),
                notes: None,
            },
            &[p.id.clone(), "P_DOES_NOT_EXIST".to_string()],
        )
        .await;
    assert!(result.is_err());
    assert_eq!(db.count_assignments_for_patient(&p.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_completing_session_twice_keeps_first_completion_time() {
    let db = memory_database().await;
    let d = doctor(&db, "U_D1").await;
    let p = patient(&db, &d, "U_P1", "Maria Garcia").await;
    let exercise_id = first_exercise_id(&db).await;
    let session = db.insert_session(&new_session(&p.id, &exercise_id)).await.unwrap();
    assert_eq!(session.status, "in_progress");
    assert!(session.completed_at.is_none());

    let complete = SessionChanges {
        status: Some("completed".to_string()),
        repetitions: Some(12),
        ..Default::default()
    };
    let first = db.update_session(&session.id, &p.id, &complete).await.unwrap().unwrap();
    let second = db.update_session(&session.id, &p.id, &complete).await.unwrap().unwrap();

    assert_eq!(first.status, "completed");
    assert!(first.completed_at.is_some());
    assert_eq!(first.completed_at, second.completed_at);
    assert_eq!(second.repetitions, 12);
}

#[tokio::test]
async fn test_reopening_session_clears_completion_time() {
    let db = memory_database().await;
    let d = doctor(&db, "U_D1").await;
    let p = patient(&db, &d, "U_P1", "Maria Garcia").await;
    let exercise_id = first_exercise_id(&db).await;
    let session = db.insert_session(&new_session(&p.id, &exercise_id)).await.unwrap();

    let with_status = |status: &str| SessionChanges {
        status: Some(status.to_string()),
        ..Default::default()
    };

    let completed = db
        .update_session(&session.id, &p.id, &with_status("completed"))
        .await
        .unwrap()
        .unwrap();
    assert!(completed.completed_at.is_some());

    let reopened = db
        .update_session(&session.id, &p.id, &with_status("in_progress"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reopened.status, "in_progress");
    assert!(reopened.completed_at.is_none());

    let recompleted = db
        .update_session(&session.id, &p.id, &with_status("completed"))
        .await
        .unwrap()
        .unwrap();
    assert!(recompleted.completed_at.is_some());

    // Changes without a status leave the completion time alone
    let noted = db
        .update_session(
            &session.id,
            &p.id,
            &SessionChanges {
                repetitions: Some(8),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(noted.completed_at, recompleted.completed_at);
}

#[tokio::test]
async fn test_update_session_of_other_patient_is_none() {
    let db = memory_database().await;
    let d = doctor(&db, "U_D1").await;
    let owner = patient(&db, &d, "U_P1", "Maria Garcia").await;
    let other = patient(&db, &d, "U_P2", "John Smith").await;
    let exercise_id = first_exercise_id(&db).await;
    let session = db.insert_session(&new_session(&owner.id, &exercise_id)).await.unwrap();

    let changes = SessionChanges {
        notes: Some(Some("hijack".to_string())),
        ..Default::default()
    };
    assert!(db.update_session(&session.id, &other.id, &changes).await.unwrap().is_none());
    assert!(db
        .find_session_with_exercise(&session.id, &other.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_notes_can_be_cleared() {
    let db = memory_database().await;
    let d = doctor(&db, "U_D1").await;
    let p = patient(&db, &d, "U_P1", "Maria Garcia").await;
    let exercise_id = first_exercise_id(&db).await;
    let mut draft = new_session(&p.id, &exercise_id);
    draft.notes = Some("left knee sore".to_string());
    let session = db.insert_session(&draft).await.unwrap();

    let cleared = db
        .update_session(
            &session.id,
            &p.id,
            &SessionChanges {
                notes: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(cleared.notes.is_none());
}

#[tokio::test]
async fn test_recent_sessions_only_cover_own_patients() {
    let db = memory_database().await;
    let d1 = doctor(&db, "U_D1").await;
    let d2 = doctor(&db, "U_D2").await;
    let mine = patient(&db, &d1, "U_P1", "Maria Garcia").await;
    let theirs = patient(&db, &d2, "U_P2", "John Smith").await;
    let exercise_id = first_exercise_id(&db).await;
    db.insert_session(&new_session(&mine.id, &exercise_id)).await.unwrap();
    db.insert_session(&new_session(&theirs.id, &exercise_id)).await.unwrap();

    let recent = db.recent_sessions_for_doctor(&d1.id, 20).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].patients.full_name, "Maria Garcia");

    let json = serde_json::to_value(&recent[0]).unwrap();
    assert_eq!(json["patients"]["full_name"], "Maria Garcia");
}

#[tokio::test]
async fn test_session_totals_and_counts() {
    let db = memory_database().await;
    let d = doctor(&db, "U_D1").await;
    let p = patient(&db, &d, "U_P1", "Maria Garcia").await;
    let exercise_id = first_exercise_id(&db).await;

    let empty = db.session_totals_for_patient(&p.id).await.unwrap();
    assert_eq!(empty.total_sessions, 0);
    assert!(empty.last_session.is_none());

    let mut done = new_session(&p.id, &exercise_id);
    done.status = "completed".to_string();
    done.duration_seconds = 120;
    done.repetitions = 10;
    let completed = db.insert_session(&done).await.unwrap();
    assert!(completed.completed_at.is_some());

    let mut open = new_session(&p.id, &exercise_id);
    open.duration_seconds = 30;
    db.insert_session(&open).await.unwrap();

    let totals = db.session_totals_for_patient(&p.id).await.unwrap();
    assert_eq!(totals.total_sessions, 2);
    assert_eq!(totals.completed_sessions, 1);
    assert_eq!(totals.total_duration, 150);
    assert_eq!(totals.total_repetitions, 10);
    assert!(totals.last_session.is_some());

    assert_eq!(db.count_sessions_for_patient(&p.id, Some("completed")).await.unwrap(), 1);
    assert_eq!(db.count_sessions_for_patient(&p.id, None).await.unwrap(), 2);
    assert_eq!(db.list_sessions_for_patient(&p.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_orphaned_patient_accounts() {
    let db = memory_database().await;
    let d = doctor(&db, "U_D1").await;
    patient(&db, &d, "U_P1", "Maria Garcia").await;
    // Self-registered patient, never attached to a doctor
    insert_auth_user(&db, "U_SELF", "self@patients.test", "patient").await;
    sqlx::query(
        "INSERT INTO auth_users (id, email, password_hash, user_metadata, created_at) VALUES (?, ?, 'x', ?, ?)",
    )
    .bind("U_ORPHAN")
    .bind("orphan@patients.test")
    .bind(serde_json::json!({ "role": "patient", "doctor_id": d.id }).to_string())
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(db.pool())
    .await
    .unwrap();

    let orphans = db.orphaned_patient_accounts().await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, "U_ORPHAN");
}
