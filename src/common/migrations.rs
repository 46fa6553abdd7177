// src/common/migrations.rs
//! Database schema management
//!
//! Tables are created with `IF NOT EXISTS`, so running this on every start is
//! safe. `reset` drops everything first and is only meant for local resets.

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::id_generator::generate_exercise_id;

/// Run all database migrations
pub async fn run_migrations(pool: &SqlitePool, reset: bool) -> Result<(), sqlx::Error> {
    if reset {
        warn!("RESET_DB=true - dropping all tables and recreating schema");
        drop_all_tables(pool).await?;
    }

    create_identity_tables(pool).await?;
    create_clinic_tables(pool).await?;
    create_exercise_tables(pool).await?;
    create_indexes(pool).await?;
    seed_exercise_catalog(pool).await?;

    info!("Database migration completed");
    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Reverse dependency order
    let tables = [
        "exercise_sessions",
        "assigned_exercises",
        "exercises",
        "patients",
        "doctors",
        "auth_users",
    ];

    for table in tables {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn create_identity_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Accounts owned by the identity provider. `user_metadata` holds the
    // JSON object the account was signed up with, including its role.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS auth_users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            user_metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_clinic_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doctors (
            id TEXT PRIMARY KEY,
            auth_user_id TEXT UNIQUE NOT NULL,
            email TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(auth_user_id) REFERENCES auth_users(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // conditions, allergies and medications are JSON arrays
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS patients (
            id TEXT PRIMARY KEY,
            doctor_id TEXT NOT NULL,
            auth_user_id TEXT UNIQUE NOT NULL,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            date_of_birth TEXT,
            age INTEGER,
            conditions TEXT NOT NULL DEFAULT '[]',
            allergies TEXT NOT NULL DEFAULT '[]',
            medications TEXT NOT NULL DEFAULT '[]',
            emergency_contact_name TEXT,
            emergency_contact_phone TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(doctor_id) REFERENCES doctors(id),
            FOREIGN KEY(auth_user_id) REFERENCES auth_users(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_exercise_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS exercises (
            id TEXT PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            description TEXT,
            category TEXT,
            difficulty TEXT,
            instructions TEXT,
            video_url TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assigned_exercises (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL,
            exercise_id TEXT NOT NULL,
            sets INTEGER NOT NULL,
            reps INTEGER NOT NULL,
            frequency TEXT NOT NULL,
            notes TEXT,
            assigned_at TEXT NOT NULL,
            FOREIGN KEY(patient_id) REFERENCES patients(id),
            FOREIGN KEY(exercise_id) REFERENCES exercises(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS exercise_sessions (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL,
            exercise_id TEXT NOT NULL,
            duration_seconds INTEGER NOT NULL DEFAULT 0,
            repetitions INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'in_progress',
            started_at TEXT NOT NULL,
            completed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(patient_id) REFERENCES patients(id),
            FOREIGN KEY(exercise_id) REFERENCES exercises(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_patients_doctor ON patients(doctor_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_assigned_patient ON assigned_exercises(patient_id, assigned_at)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_patient ON exercise_sessions(patient_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_status ON exercise_sessions(patient_id, status)",
    ];

    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

/// Default catalog, inserted only into an empty `exercises` table
const DEFAULT_EXERCISES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Squats",
        "Bodyweight squat to parallel",
        "lower_body",
        "beginner",
        "Feet shoulder-width apart, lower hips until thighs are parallel, drive up through heels.",
    ),
    (
        "Shoulder Press",
        "Overhead press with light dumbbells",
        "upper_body",
        "intermediate",
        "Start at shoulder height, press overhead without arching the lower back.",
    ),
    (
        "Bicep Curls",
        "Standing dumbbell curl",
        "upper_body",
        "beginner",
        "Elbows fixed at the sides, curl to the shoulder and lower slowly.",
    ),
    (
        "Lunges",
        "Alternating forward lunge",
        "lower_body",
        "intermediate",
        "Step forward, lower the back knee toward the floor, push back to standing.",
    ),
    (
        "Knee Extensions",
        "Seated knee extension for quadriceps",
        "rehabilitation",
        "beginner",
        "Sit tall, straighten one knee fully, hold two seconds, lower under control.",
    ),
];

async fn seed_exercise_catalog(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercises")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let now = chrono::Utc::now().to_rfc3339();
    for &(name, description, category, difficulty, instructions) in DEFAULT_EXERCISES {
        sqlx::query(
            r#"
            INSERT INTO exercises (id, name, description, category, difficulty, instructions, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(generate_exercise_id())
        .bind(name)
        .bind(description)
        .bind(category)
        .bind(difficulty)
        .bind(instructions)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    info!(count = DEFAULT_EXERCISES.len(), "Seeded exercise catalog");
    Ok(())
}
