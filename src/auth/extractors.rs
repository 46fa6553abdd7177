//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use tracing::warn;

use super::models::{IdentityUser, Role};
use crate::common::ApiError;

/// Caller identity placed in the request extensions by `resolve_identity`.
///
/// Extracting it on a route that is not behind the middleware yields 401.
#[derive(Debug, Clone, Serialize)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
    pub role: Option<Role>,
    pub user_metadata: serde_json::Value,
}

impl AuthedUser {
    /// 403 with `reason` unless the caller carries `role`
    pub fn require_role(&self, role: Role, reason: &str) -> Result<(), ApiError> {
        if self.role == Some(role) {
            return Ok(());
        }
        warn!(
            user_id = %self.id,
            required = %role,
            actual = ?self.role,
            "Authorization denied"
        );
        Err(ApiError::Forbidden(reason.to_string()))
    }
}

impl From<IdentityUser> for AuthedUser {
    fn from(user: IdentityUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            user_metadata: user.user_metadata,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthedUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
    }
}
