//! Authorization guard.
//!
//! Turns a bearer token into a live [`Identity`] and answers the ownership
//! and role questions the routes ask. All decisions go through
//! [`Policy::evaluate`]; this module only does the lookups.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::db::Store;
use crate::domain::policy::{Decision, Policy};
use crate::domain::{Identity, Role, StoryRef, UserStatus};
use crate::entities::stories;
use crate::services::AuthError;
use crate::services::token::TokenService;

#[derive(Clone)]
pub struct AuthorizationGuard {
    store: Store,
    tokens: Arc<TokenService>,
}

impl AuthorizationGuard {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// Verifies the token, then re-reads the account. Token claims are only
    /// trusted for the subject id; role and status come from the store.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingToken`] when no token was sent
    /// - [`AuthError::InvalidToken`] for a bad signature or an expired token
    /// - [`AuthError::Unauthorized`] when the account no longer exists
    /// - [`AuthError::Forbidden`] when the account is banned
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Identity, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.verify(token)?;

        let user = self
            .store
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Account no longer exists".to_string()))?;

        let status: UserStatus = user.status.parse().map_err(AuthError::Internal)?;
        if status == UserStatus::Banned {
            return Err(AuthError::Forbidden("Account is banned".to_string()));
        }

        Ok(Identity {
            id: user.id,
            role: user.role.parse().map_err(AuthError::Internal)?,
            username: user.username,
        })
    }

    /// Admins always pass; everyone else must hold one of `allowed`.
    #[must_use]
    pub fn authorize_role(&self, identity: &Identity, allowed: &[Role]) -> bool {
        Policy::AnyRole(allowed).evaluate(identity).is_allowed()
    }

    /// Title references are resolved to the stored story first, so both
    /// addressing modes share the same ownership rule.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] if the story does not exist.
    pub async fn resolve_story(&self, story: &StoryRef) -> Result<stories::Model, AuthError> {
        let found = match story {
            StoryRef::Id(id) => self.store.get_story(*id).await?,
            StoryRef::Title(title) => self.store.get_story_by_title(title).await?,
        };

        found.ok_or_else(|| AuthError::NotFound(format!("Story {story} not found")))
    }

    pub async fn authorize_owner_of_story(
        &self,
        identity: &Identity,
        story: &StoryRef,
    ) -> Result<bool, AuthError> {
        let story = self.resolve_story(story).await?;
        Ok(Self::decide_owner(identity, story.created_by).is_allowed())
    }

    /// Two hops: chapter to story, story to owner. A miss on either hop is
    /// [`AuthError::NotFound`], never a denial.
    pub async fn authorize_owner_of_chapter(
        &self,
        identity: &Identity,
        chapter_id: Uuid,
    ) -> Result<bool, AuthError> {
        let chapter = self
            .store
            .get_chapter(chapter_id)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("Chapter {chapter_id} not found")))?;

        let story = self.store.get_story(chapter.story_id).await?.ok_or_else(|| {
            AuthError::NotFound(format!(
                "Story {} for chapter {chapter_id} not found",
                chapter.story_id
            ))
        })?;

        Ok(Self::decide_owner(identity, story.created_by).is_allowed())
    }

    fn decide_owner(identity: &Identity, owner: Uuid) -> Decision {
        let decision = Policy::Owner(owner).evaluate(identity);
        if decision == Decision::AllowAdminOverride {
            debug!(user_id = %identity.id, %owner, "Admin override on owner check");
        }
        decision
    }

    pub fn require_role(&self, identity: &Identity, allowed: &[Role]) -> Result<(), AuthError> {
        if self.authorize_role(identity, allowed) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(format!(
                "Requires role: {}",
                allowed
                    .iter()
                    .map(Role::as_str)
                    .collect::<Vec<_>>()
                    .join(" or ")
            )))
        }
    }

    pub fn require_admin(&self, identity: &Identity) -> Result<(), AuthError> {
        if Policy::Admin.evaluate(identity).is_allowed() {
            Ok(())
        } else {
            Err(AuthError::Forbidden("Admin access required".to_string()))
        }
    }

    pub async fn require_owner_of_story(
        &self,
        identity: &Identity,
        story: &StoryRef,
    ) -> Result<(), AuthError> {
        if self.authorize_owner_of_story(identity, story).await? {
            Ok(())
        } else {
            Err(AuthError::Forbidden(
                "Only the story's author may do this".to_string(),
            ))
        }
    }

    pub async fn require_owner_of_chapter(
        &self,
        identity: &Identity,
        chapter_id: Uuid,
    ) -> Result<(), AuthError> {
        if self.authorize_owner_of_chapter(identity, chapter_id).await? {
            Ok(())
        } else {
            Err(AuthError::Forbidden(
                "Only the story's author may change its chapters".to_string(),
            ))
        }
    }
}
