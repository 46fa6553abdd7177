//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// JWT claims structure
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "doctor" => Some(Role::Doctor),
            "patient" => Some(Role::Patient),
            _ => None,
        }
    }

    /// Reads the `role` key of an identity's user metadata
    pub fn from_metadata(metadata: &serde_json::Value) -> Option<Role> {
        metadata.get("role").and_then(|v| v.as_str()).and_then(Role::parse)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user record as issued by the identity provider
#[derive(Debug, Clone, Serialize)]
pub struct IdentityUser {
    pub id: String,
    pub email: String,
    pub role: Option<Role>,
    pub user_metadata: serde_json::Value,
    pub created_at: String,
}

/// `auth_users` row
#[derive(FromRow, Debug)]
pub struct AuthUserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub user_metadata: String,
    pub created_at: String,
}

impl From<AuthUserRow> for IdentityUser {
    fn from(row: AuthUserRow) -> Self {
        let user_metadata: serde_json::Value =
            serde_json::from_str(&row.user_metadata).unwrap_or_else(|_| serde_json::json!({}));
        IdentityUser {
            id: row.id,
            email: row.email,
            role: Role::from_metadata(&user_metadata),
            user_metadata,
            created_at: row.created_at,
        }
    }
}

/// Bearer token handed out on sign-in
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: IdentityUser,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
