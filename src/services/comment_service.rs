//! Domain service for chapter comments.

use uuid::Uuid;

use crate::domain::{Identity, Page};
use crate::entities::comments;
pub use crate::services::story_service::ContentError;

pub const COMMENT_MAX_LEN: usize = 1000;

#[async_trait::async_trait]
pub trait CommentService: Send + Sync {
    /// Stores a trimmed comment of 1 to 1000 characters.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the story or chapter is missing
    /// and [`ContentError::Validation`] if the chapter belongs to another
    /// story or the content length is out of range.
    async fn add_comment(
        &self,
        author: &Identity,
        story_id: Uuid,
        chapter_id: Uuid,
        content: &str,
    ) -> Result<comments::Model, ContentError>;

    /// Oldest first, with the total number of comments on the chapter.
    async fn list_comments(
        &self,
        chapter_id: Uuid,
        page: Page,
    ) -> Result<(Vec<comments::Model>, u64), ContentError>;
}
