//! Shared fixtures for unit tests

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Extension;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::auth::models::{AuthSession, IdentityUser};
use crate::auth::{AuthedUser, IdentityError, IdentityProvider, LocalIdentityProvider, Role};
use crate::common::migrations::run_migrations;
use crate::common::{AppConfig, AppState, SharedState};
use crate::notifications::{ConnectionRegistry, NotificationDispatcher};
use crate::services::database::{Database, Doctor, NewPatient, Patient};
use crate::services::email::{MailError, Mailer, OutgoingEmail};

/// Migrated in-memory database. A single connection that never expires,
/// because every new SQLite memory connection starts empty.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool, false).await.unwrap();
    pool
}

pub async fn memory_database() -> Database {
    Database::new(memory_pool().await)
}

pub async fn insert_auth_user(db: &Database, id: &str, email: &str, role: &str) {
    sqlx::query(
        "INSERT INTO auth_users (id, email, password_hash, user_metadata, created_at) VALUES (?, ?, 'x', ?, ?)",
    )
    .bind(id)
    .bind(email)
    .bind(serde_json::json!({ "role": role }).to_string())
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(db.pool())
    .await
    .unwrap();
}

pub async fn doctor(db: &Database, auth_user_id: &str) -> Doctor {
    insert_auth_user(db, auth_user_id, &format!("{}@clinic.test", auth_user_id), "doctor").await;
    db.get_or_create_doctor(auth_user_id, &format!("{}@clinic.test", auth_user_id))
        .await
        .unwrap()
}

pub async fn patient(db: &Database, doctor: &Doctor, auth_user_id: &str, full_name: &str) -> Patient {
    let email = format!("{}@patients.test", auth_user_id);
    insert_auth_user(db, auth_user_id, &email, "patient").await;
    db.insert_patient(&NewPatient {
        doctor_id: doctor.id.clone(),
        auth_user_id: auth_user_id.to_string(),
        full_name: full_name.to_string(),
        email,
        phone: "555-000-1234".to_string(),
        date_of_birth: None,
        age: Some(40),
        conditions: vec!["knee pain".to_string()],
        allergies: Vec::new(),
        medications: Vec::new(),
        emergency_contact_name: None,
        emergency_contact_phone: None,
        notes: None,
    })
    .await
    .unwrap()
}

pub async fn first_exercise_id(db: &Database) -> String {
    db.list_exercises().await.unwrap()[0].id.clone()
}

pub const TEST_JWT_SECRET: &str = "test_secret_key";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        token_ttl_hours: 1,
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        login_url: "http://localhost:3000/login".to_string(),
        ses_from_email: None,
        ses_region: "us-east-1".to_string(),
        reset_db: false,
    }
}

/// Mailer that keeps every message in memory, or fails every send
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Ses("mail transport unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Local provider whose account deletion always fails
pub struct UndeletableIdentity(pub LocalIdentityProvider);

#[async_trait]
impl IdentityProvider for UndeletableIdentity {
    async fn verify_token(&self, token: &str) -> Result<IdentityUser, IdentityError> {
        self.0.verify_token(token).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<IdentityUser, IdentityError> {
        self.0.sign_up(email, password, metadata).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        self.0.sign_in(email, password).await
    }

    fn issue_session(&self, user: IdentityUser) -> Result<AuthSession, IdentityError> {
        self.0.issue_session(user)
    }

    async fn delete_user(&self, _user_id: &str) -> Result<(), IdentityError> {
        Err(IdentityError::Backend("deletion disabled".to_string()))
    }
}

/// Application state over an in-memory database, plus handles for assertions
pub struct TestApp {
    pub state: SharedState,
    pub db: Database,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<RecordingMailer>,
    pub registry: ConnectionRegistry,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = memory_pool().await;
        let identity = LocalIdentityProvider::new(pool.clone(), TEST_JWT_SECRET.to_string(), 1);
        Self::build(pool, Arc::new(identity), RecordingMailer::default())
    }

    pub async fn with_undeletable_accounts() -> Self {
        let pool = memory_pool().await;
        let identity = LocalIdentityProvider::new(pool.clone(), TEST_JWT_SECRET.to_string(), 1);
        Self::build(pool, Arc::new(UndeletableIdentity(identity)), RecordingMailer::default())
    }

    pub async fn with_failing_mailer() -> Self {
        let pool = memory_pool().await;
        let identity = LocalIdentityProvider::new(pool.clone(), TEST_JWT_SECRET.to_string(), 1);
        let mailer = RecordingMailer {
            fail: true,
            ..Default::default()
        };
        Self::build(pool, Arc::new(identity), mailer)
    }

    fn build(pool: SqlitePool, identity: Arc<dyn IdentityProvider>, mailer: RecordingMailer) -> Self {
        let db = Database::new(pool);
        let mailer = Arc::new(mailer);
        let registry = ConnectionRegistry::new();
        let state = AppState {
            db: db.clone(),
            identity: identity.clone(),
            mailer: mailer.clone(),
            registry: registry.clone(),
            dispatcher: NotificationDispatcher::new(db.clone(), registry.clone()),
            config: test_config(),
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            db,
            identity,
            mailer,
            registry,
        }
    }

    /// Registers an account with the given role and returns it as a caller
    pub async fn user(&self, email: &str, role: Role) -> AuthedUser {
        let user = self
            .identity
            .sign_up(email, "password123", serde_json::json!({ "role": role.as_str() }))
            .await
            .unwrap();
        AuthedUser::from(user)
    }

    pub fn extension(&self) -> Extension<SharedState> {
        Extension(self.state.clone())
    }
}

/// Status and JSON body of any response
pub async fn response_json(response: impl IntoResponse) -> (StatusCode, serde_json::Value) {
    let response = response.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
