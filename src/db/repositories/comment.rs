use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::Page;
use crate::entities::{comments, prelude::*};

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        story_id: Uuid,
        chapter_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<comments::Model> {
        let now = Utc::now();
        comments::ActiveModel {
            id: Set(Uuid::new_v4()),
            story_id: Set(story_id),
            chapter_id: Set(chapter_id),
            user_id: Set(user_id),
            content: Set(content.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert comment")
    }

    /// Oldest first.
    pub async fn list_for_chapter(
        &self,
        chapter_id: Uuid,
        page: Page,
    ) -> Result<(Vec<comments::Model>, u64)> {
        let query = Comments::find().filter(comments::Column::ChapterId.eq(chapter_id));

        let total = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count comments")?;

        let rows = query
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.conn)
            .await
            .context("Failed to list comments")?;

        Ok((rows, total))
    }

    pub async fn delete_for_story(&self, story_id: Uuid) -> Result<u64> {
        let result = Comments::delete_many()
            .filter(comments::Column::StoryId.eq(story_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete comments for story")?;

        Ok(result.rows_affected)
    }
}
