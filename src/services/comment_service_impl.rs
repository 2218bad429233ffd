//! `SeaORM` implementation of the `CommentService` trait.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::db::Store;
use crate::domain::{Identity, Page};
use crate::entities::comments;
use crate::services::comment_service::{COMMENT_MAX_LEN, CommentService, ContentError};

pub struct SeaOrmCommentService {
    store: Store,
}

impl SeaOrmCommentService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommentService for SeaOrmCommentService {
    async fn add_comment(
        &self,
        author: &Identity,
        story_id: Uuid,
        chapter_id: Uuid,
        content: &str,
    ) -> Result<comments::Model, ContentError> {
        let content = content.trim();
        let length = content.chars().count();
        if length == 0 || length > COMMENT_MAX_LEN {
            return Err(ContentError::Validation(format!(
                "Comment must be between 1 and {COMMENT_MAX_LEN} characters"
            )));
        }

        if self.store.get_story(story_id).await?.is_none() {
            return Err(ContentError::story_not_found(story_id));
        }

        let chapter = self
            .store
            .get_chapter(chapter_id)
            .await?
            .ok_or_else(|| ContentError::chapter_not_found(chapter_id))?;

        if chapter.story_id != story_id {
            return Err(ContentError::Validation(format!(
                "Chapter {chapter_id} does not belong to story {story_id}"
            )));
        }

        let comment = self
            .store
            .insert_comment(story_id, chapter_id, author.id, content)
            .await?;

        debug!(comment_id = %comment.id, %chapter_id, user_id = %author.id, "Comment added");
        Ok(comment)
    }

    async fn list_comments(
        &self,
        chapter_id: Uuid,
        page: Page,
    ) -> Result<(Vec<comments::Model>, u64), ContentError> {
        Ok(self.store.list_comments(chapter_id, page).await?)
    }
}
