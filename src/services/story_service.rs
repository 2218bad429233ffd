//! Domain service for stories: browsing, authoring, moderation and the
//! cascading delete.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{GenreCount, StoreError, StoryFilter};
use crate::domain::{Identity, Page};
use crate::entities::{chapters, stories};

/// Errors shared by the story, chapter and comment services.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ContentError {
    pub(crate) fn story_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("Story {id} not found"))
    }

    pub(crate) fn chapter_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("Chapter {id} not found"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewStory {
    pub title: String,
    /// Display name; defaults to the creator's username.
    pub author: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub cover_url: Option<String>,
    pub status: Option<String>,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct StoryChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub genres: Option<Vec<String>>,
    pub cover_url: Option<String>,
    pub status: Option<String>,
    pub is_hidden: Option<bool>,
    /// Admin only.
    pub is_featured: Option<bool>,
}

impl StoryChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.description.is_none()
            && self.genres.is_none()
            && self.cover_url.is_none()
            && self.status.is_none()
            && self.is_hidden.is_none()
            && self.is_featured.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct StoryWithLatest {
    pub story: stories::Model,
    pub latest_chapter: Option<chapters::Model>,
}

#[derive(Debug, Clone)]
pub struct StoryExport {
    pub story: stories::Model,
    pub chapters: Vec<chapters::Model>,
}

/// Rows removed per stage of a story deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub bookshelf_entries: u64,
    pub comments: u64,
    pub chapters: u64,
}

/// Domain service trait for stories.
#[async_trait::async_trait]
pub trait StoryService: Send + Sync {
    /// Creates a story owned by `creator`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Validation`] for a missing or oversized title
    /// and [`ContentError::Conflict`] if the title is taken.
    async fn create_story(
        &self,
        creator: &Identity,
        story: NewStory,
    ) -> Result<stories::Model, ContentError>;

    /// Gets a visible story.
    async fn get_story(&self, id: Uuid) -> Result<stories::Model, ContentError>;

    async fn list_stories(&self) -> Result<Vec<stories::Model>, ContentError>;

    /// Case-insensitive title substring search over visible stories.
    async fn search_stories(&self, name: &str) -> Result<Vec<stories::Model>, ContentError>;

    async fn filter_stories(
        &self,
        filter: &StoryFilter,
        page: Page,
    ) -> Result<(Vec<stories::Model>, u64), ContentError>;

    /// Top `limit` visible stories by view count.
    async fn ranking(&self, limit: u64) -> Result<Vec<stories::Model>, ContentError>;

    async fn featured(&self) -> Result<Vec<stories::Model>, ContentError>;

    /// Most recently updated visible stories with their newest chapter.
    async fn latest(&self, limit: u64) -> Result<Vec<StoryWithLatest>, ContentError>;

    async fn genre_counts(&self) -> Result<Vec<GenreCount>, ContentError>;

    /// Every story created by `user_id`, hidden and banned ones included.
    async fn stories_by_creator(&self, user_id: Uuid)
    -> Result<Vec<stories::Model>, ContentError>;

    /// Visible chapters of a visible story, in reading order.
    async fn list_chapters(&self, story_id: Uuid) -> Result<Vec<chapters::Model>, ContentError>;

    /// The story and all of its visible chapters in one read.
    async fn export_story(&self, story_id: Uuid) -> Result<StoryExport, ContentError>;

    /// Applies `changes`. Ownership is checked by the caller; this only
    /// enforces field-level rules.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Forbidden`] if a non-admin sets `is_featured`.
    async fn update_story(
        &self,
        editor: &Identity,
        id: Uuid,
        changes: StoryChanges,
    ) -> Result<stories::Model, ContentError>;

    /// Removes bookshelf entries, comments, chapters and finally the story.
    ///
    /// The stages are not atomic. A failure stops the cascade before the
    /// story row goes, so the call can be retried.
    async fn delete_story(&self, id: Uuid) -> Result<CascadeReport, ContentError>;

    /// Hides a story from every public read and stamps `deleted_at`.
    async fn ban_story(&self, title: &str) -> Result<(), ContentError>;

    async fn unban_story(&self, title: &str) -> Result<(), ContentError>;

    /// Author self-service hard delete: allowed only when the caller created
    /// the story and it has already been banned.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] for an unknown title and
    /// [`ContentError::Forbidden`] unless both conditions hold.
    async fn delete_story_by_author(
        &self,
        identity: &Identity,
        title: &str,
    ) -> Result<CascadeReport, ContentError>;
}
