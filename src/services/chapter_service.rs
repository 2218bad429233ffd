//! Domain service for chapters: numbering, reads that count views, and the
//! counter bookkeeping on the parent story.

use uuid::Uuid;

use crate::entities::chapters;
pub use crate::services::story_service::ContentError;

#[derive(Debug, Clone, Default)]
pub struct ChapterChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_hidden: Option<bool>,
}

/// A chapter read by id, with its closest visible siblings.
#[derive(Debug, Clone)]
pub struct ChapterWithNeighbours {
    pub chapter: chapters::Model,
    pub previous: Option<chapters::Model>,
    pub next: Option<chapters::Model>,
}

/// Domain service trait for chapters.
#[async_trait::async_trait]
pub trait ChapterService: Send + Sync {
    /// Appends a chapter to `story_id` with the next free number and bumps the
    /// story's `chapters_count` as a best-effort follow-up.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the story does not exist and
    /// [`ContentError::Validation`] for a missing title or content.
    async fn create_chapter(
        &self,
        story_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<chapters::Model, ContentError>;

    async fn update_chapter(
        &self,
        id: Uuid,
        changes: ChapterChanges,
    ) -> Result<chapters::Model, ContentError>;

    /// Deletes a chapter and decrements the story's `chapters_count`
    /// (best-effort). Numbers of the remaining chapters are untouched.
    async fn delete_chapter(&self, id: Uuid) -> Result<(), ContentError>;

    /// Reads a visible chapter by position. Every successful read adds one
    /// view to the chapter and one to the story.
    async fn read_by_story_and_number(
        &self,
        story_id: Uuid,
        number: i32,
    ) -> Result<chapters::Model, ContentError>;

    /// Reads a visible chapter by id. The returned chapter carries the
    /// view count after this read's increment.
    async fn read_by_id(&self, id: Uuid) -> Result<ChapterWithNeighbours, ContentError>;
}
