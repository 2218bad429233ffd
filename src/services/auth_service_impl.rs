//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task;
use tracing::info;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::user::{hash_password, verify_password};
use crate::domain::{Role, UserStatus};
use crate::services::auth_service::{AuthError, AuthService, LoginResult, UserInfo};
use crate::services::token::TokenService;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenService>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenService>, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            security,
        }
    }

    fn validate_credentials<'a>(
        &self,
        username: &'a str,
        password: &str,
    ) -> Result<&'a str, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let length = username.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
            return Err(AuthError::Validation(format!(
                "Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
            )));
        }

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(AuthError::Validation(
                "Username can only contain letters, numbers, underscores, hyphens and dots"
                    .to_string(),
            ));
        }

        if password.chars().count() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.security.min_password_length
            )));
        }

        Ok(username)
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let security = self.security.clone();

        // Argon2 is CPU-bound; keep it off the async workers.
        let hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task panicked: {e}")))??;

        Ok(hash)
    }

    async fn create_account(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<UserInfo, AuthError> {
        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }

        let password_hash = self.hash(password).await?;

        let user = self
            .store
            .create_user(username, password_hash, role, UserStatus::Active)
            .await
            .map_err(|e| {
                if e.is_duplicate() {
                    AuthError::Conflict(format!("Username '{username}' is already taken"))
                } else {
                    AuthError::Store(e)
                }
            })?;

        info!(user_id = %user.id, username, role = %role, "Account created");
        UserInfo::try_from(user)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        let username = self.validate_credentials(username, password)?;
        self.create_account(username, password, Role::User).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let Some(user) = self.store.get_user_by_username(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        let password_hash = user.password_hash.clone();
        let candidate = password.to_string();
        let is_valid = task::spawn_blocking(move || verify_password(&password_hash, &candidate))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task panicked: {e}")))??;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let info = UserInfo::try_from(user)?;
        if info.status == UserStatus::Banned {
            return Err(AuthError::Forbidden("Account is banned".to_string()));
        }

        let token = self.tokens.issue(info.id, &info.username, info.role)?;

        Ok(LoginResult { token, user: info })
    }

    async fn get_user(&self, id: Uuid) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("User {id} not found")))?;

        UserInfo::try_from(user)
    }

    async fn set_role(&self, username: &str, role: Role) -> Result<UserInfo, AuthError> {
        if !self.store.set_user_role(username, role).await? {
            return Err(AuthError::NotFound(format!("User '{username}' not found")));
        }

        info!(username, role = %role, "Account role changed");
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("User '{username}' not found")))?;

        UserInfo::try_from(user)
    }

    async fn set_status(
        &self,
        username: &str,
        status: UserStatus,
    ) -> Result<UserInfo, AuthError> {
        if !self.store.set_user_status(username, status).await? {
            return Err(AuthError::NotFound(format!("User '{username}' not found")));
        }

        info!(username, status = %status, "Account status changed");
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("User '{username}' not found")))?;

        UserInfo::try_from(user)
    }

    async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        let username = username.trim();
        if self.store.get_user_by_username(username).await?.is_some() {
            return Ok(false);
        }

        self.create_account(username, password, Role::Admin).await?;
        Ok(true)
    }
}
