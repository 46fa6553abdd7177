//! Identity provider
//!
//! Issues and validates bearer credentials and owns the `auth_users` table.
//! Everything else in the crate reaches it through the `IdentityProvider`
//! trait and never reads `auth_users` directly (the reconciliation query in
//! the gateway being the one exception).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{AuthSession, AuthUserRow, Claims, IdentityUser};
use crate::common::{generate_user_id, safe_email_log, ApiError};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("user not found")]
    UserNotFound,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("identity backend failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for IdentityError {
    fn from(e: sqlx::Error) -> Self {
        IdentityError::Backend(e.to_string())
    }
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::InvalidToken | IdentityError::UserNotFound => {
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            IdentityError::EmailTaken => {
                ApiError::BadRequest("Email is already registered".to_string())
            }
            IdentityError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            IdentityError::Backend(cause) => ApiError::internal("Identity provider error", cause),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validates a bearer token and loads the current user record
    async fn verify_token(&self, token: &str) -> Result<IdentityUser, IdentityError>;

    /// Creates an account; `metadata` carries the role and profile hints
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<IdentityUser, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    /// Issues a token for an existing user
    fn issue_session(&self, user: IdentityUser) -> Result<AuthSession, IdentityError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError>;
}

/// Identity provider backed by the service's own SQLite database and HS256 JWTs
pub struct LocalIdentityProvider {
    db: SqlitePool,
    jwt_secret: String,
    token_ttl: Duration,
}

impl LocalIdentityProvider {
    pub fn new(db: SqlitePool, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self {
            db,
            jwt_secret,
            token_ttl: Duration::hours(token_ttl_hours),
        }
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<AuthUserRow>, IdentityError> {
        let row = sqlx::query_as::<_, AuthUserRow>(
            "SELECT id, email, password_hash, user_metadata, created_at FROM auth_users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Backend(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<IdentityUser, IdentityError> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            warn!(error = %e, "JWT token validation failed");
            IdentityError::InvalidToken
        })?;

        let user_id = decoded.claims.sub;
        match self.find_user(&user_id).await? {
            Some(row) => Ok(row.into()),
            None => {
                warn!(user_id = %user_id, "Token subject no longer exists");
                Err(IdentityError::UserNotFound)
            }
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<IdentityUser, IdentityError> {
        let id = generate_user_id();
        let password_hash = hash_password(password)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO auth_users (id, email, password_hash, user_metadata, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(email.trim().to_lowercase())
        .bind(&password_hash)
        .bind(metadata.to_string())
        .bind(&now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                IdentityError::EmailTaken
            } else {
                IdentityError::from(e)
            }
        })?;

        info!(user_id = %id, email = %safe_email_log(email), "Identity account created");

        self.find_user(&id)
            .await?
            .map(IdentityUser::from)
            .ok_or(IdentityError::UserNotFound)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let row = sqlx::query_as::<_, AuthUserRow>(
            "SELECT id, email, password_hash, user_metadata, created_at FROM auth_users WHERE email = ?",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?;

        let row = match row {
            Some(row) if verify_password(password, &row.password_hash) => row,
            _ => {
                debug!(email = %safe_email_log(email), "Sign-in rejected");
                return Err(IdentityError::InvalidCredentials);
            }
        };

        self.issue_session(row.into())
    }

    fn issue_session(&self, user: IdentityUser) -> Result<AuthSession, IdentityError> {
        let expires_at = Utc::now() + self.token_ttl;
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role.map(|r| r.as_str().to_string()),
            exp: expires_at.timestamp() as usize,
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| IdentityError::Backend(format!("Failed to sign token: {}", e)))?;

        Ok(AuthSession {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.token_ttl.num_seconds(),
            user,
        })
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError> {
        let result = sqlx::query("DELETE FROM auth_users WHERE id = ?")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound);
        }
        info!(user_id = %user_id, "Identity account deleted");
        Ok(())
    }
}
