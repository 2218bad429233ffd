use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::entities::{chapters, prelude::*, stories};

pub struct ChapterRepository {
    conn: DatabaseConnection,
}

impl ChapterRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn visible() -> Condition {
        Condition::all()
            .add(chapters::Column::IsHidden.eq(false))
            .add(chapters::Column::IsBanned.eq(false))
    }

    /// Reserves the next chapter number on the parent story and inserts the
    /// chapter in the same transaction. Returns `None` if the story is gone.
    ///
    /// Numbers come from `stories.last_chapter_number`, which only grows, so a
    /// number is never handed out twice even after deletions.
    pub async fn create_next(
        &self,
        story_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Option<chapters::Model>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin chapter insert")?;

        let reserved = Stories::update_many()
            .col_expr(
                stories::Column::LastChapterNumber,
                Expr::col(stories::Column::LastChapterNumber).add(1),
            )
            .filter(stories::Column::Id.eq(story_id))
            .exec(&txn)
            .await
            .context("Failed to reserve chapter number")?;

        if reserved.rows_affected == 0 {
            return Ok(None);
        }

        let number: i32 = Stories::find_by_id(story_id)
            .select_only()
            .column(stories::Column::LastChapterNumber)
            .into_tuple()
            .one(&txn)
            .await
            .context("Failed to read reserved chapter number")?
            .ok_or_else(|| anyhow::anyhow!("Story {story_id} vanished during chapter insert"))?;

        let now = Utc::now();
        let chapter = chapters::ActiveModel {
            id: Set(Uuid::new_v4()),
            story_id: Set(story_id),
            chapter_number: Set(number),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            view_count: Set(0),
            is_hidden: Set(false),
            is_banned: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .context("Failed to insert chapter")?;

        txn.commit()
            .await
            .context("Failed to commit chapter insert")?;

        Ok(Some(chapter))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<chapters::Model>> {
        Chapters::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query chapter by ID")
    }

    pub async fn update(&self, model: chapters::ActiveModel) -> Result<chapters::Model> {
        model
            .update(&self.conn)
            .await
            .context("Failed to update chapter")
    }

    pub async fn list_visible_for_story(&self, story_id: Uuid) -> Result<Vec<chapters::Model>> {
        Chapters::find()
            .filter(chapters::Column::StoryId.eq(story_id))
            .filter(Self::visible())
            .order_by_asc(chapters::Column::ChapterNumber)
            .all(&self.conn)
            .await
            .context("Failed to list chapters for story")
    }

    pub async fn latest_visible_for_story(
        &self,
        story_id: Uuid,
    ) -> Result<Option<chapters::Model>> {
        Chapters::find()
            .filter(chapters::Column::StoryId.eq(story_id))
            .filter(Self::visible())
            .order_by_desc(chapters::Column::ChapterNumber)
            .one(&self.conn)
            .await
            .context("Failed to query latest chapter")
    }

    pub async fn count_for_story(&self, story_id: Uuid) -> Result<u64> {
        Chapters::find()
            .filter(chapters::Column::StoryId.eq(story_id))
            .count(&self.conn)
            .await
            .context("Failed to count chapters")
    }

    /// `view_count + 1` and read-back in one transaction. `None` when the
    /// chapter does not exist.
    pub async fn increment_views(&self, id: Uuid) -> Result<Option<chapters::Model>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin chapter view update")?;

        let updated = Chapters::update_many()
            .col_expr(
                chapters::Column::ViewCount,
                Expr::col(chapters::Column::ViewCount).add(1),
            )
            .filter(chapters::Column::Id.eq(id))
            .exec(&txn)
            .await
            .context("Failed to increment chapter views")?;

        if updated.rows_affected == 0 {
            return Ok(None);
        }

        let chapter = Chapters::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to read chapter after view update")?;

        txn.commit()
            .await
            .context("Failed to commit chapter view update")?;

        Ok(chapter)
    }

    /// Same as [`Self::increment_views`], addressed by position and limited to
    /// chapters that are not hidden or banned.
    pub async fn increment_views_by_number(
        &self,
        story_id: Uuid,
        number: i32,
    ) -> Result<Option<chapters::Model>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin chapter view update")?;

        let position = Condition::all()
            .add(chapters::Column::StoryId.eq(story_id))
            .add(chapters::Column::ChapterNumber.eq(number))
            .add(Self::visible());

        let updated = Chapters::update_many()
            .col_expr(
                chapters::Column::ViewCount,
                Expr::col(chapters::Column::ViewCount).add(1),
            )
            .filter(position.clone())
            .exec(&txn)
            .await
            .context("Failed to increment chapter views")?;

        if updated.rows_affected == 0 {
            return Ok(None);
        }

        let chapter = Chapters::find()
            .filter(position)
            .one(&txn)
            .await
            .context("Failed to read chapter after view update")?;

        txn.commit()
            .await
            .context("Failed to commit chapter view update")?;

        Ok(chapter)
    }

    /// Closest visible chapters on either side of `number` within the story.
    pub async fn neighbours(
        &self,
        story_id: Uuid,
        number: i32,
    ) -> Result<(Option<chapters::Model>, Option<chapters::Model>)> {
        let previous = Chapters::find()
            .filter(chapters::Column::StoryId.eq(story_id))
            .filter(chapters::Column::ChapterNumber.lt(number))
            .filter(Self::visible())
            .order_by_desc(chapters::Column::ChapterNumber)
            .one(&self.conn)
            .await
            .context("Failed to query previous chapter")?;

        let next = Chapters::find()
            .filter(chapters::Column::StoryId.eq(story_id))
            .filter(chapters::Column::ChapterNumber.gt(number))
            .filter(Self::visible())
            .order_by_asc(chapters::Column::ChapterNumber)
            .one(&self.conn)
            .await
            .context("Failed to query next chapter")?;

        Ok((previous, next))
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = Chapters::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete chapter")?;

        Ok(result.rows_affected)
    }

    pub async fn delete_for_story(&self, story_id: Uuid) -> Result<u64> {
        let result = Chapters::delete_many()
            .filter(chapters::Column::StoryId.eq(story_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete chapters for story")?;

        Ok(result.rows_affected)
    }
}
