//! Domain service for accounts: registration, login and admin moderation.
//!
//! [`AuthError`] is shared with the token service and the authorization
//! guard so that every authentication failure maps to the same responses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreError;
use crate::domain::{Role, UserStatus};
use crate::entities::users;

/// Errors specific to authentication and authorization.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The token was valid but its subject no longer exists.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<users::Model> for UserInfo {
    type Error = AuthError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            role: model.role.parse().map_err(AuthError::Internal)?,
            status: model.status.parse().map_err(AuthError::Internal)?,
            id: model.id,
            username: model.username,
            created_at: model.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: UserInfo,
}

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an active account with the `user` role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for malformed credentials and
    /// [`AuthError::Conflict`] if the username is taken.
    async fn register(&self, username: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// Verifies credentials and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails and
    /// [`AuthError::Forbidden`] for banned accounts.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Gets the current record for an account.
    async fn get_user(&self, id: Uuid) -> Result<UserInfo, AuthError>;

    async fn set_role(&self, username: &str, role: Role) -> Result<UserInfo, AuthError>;

    async fn set_status(&self, username: &str, status: UserStatus)
    -> Result<UserInfo, AuthError>;

    /// Creates an admin account unless `username` already exists. Returns
    /// whether an account was created.
    async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AuthError>;
}
