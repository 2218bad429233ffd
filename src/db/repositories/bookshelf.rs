use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, sea_query::OnConflict,
};
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{Page, SortOrder};
use crate::entities::{bookshelf_items, chapters, prelude::*, stories};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookshelfSort {
    #[default]
    UpdatedAt,
    AddedAt,
    StoryTitle,
    ChapterNumber,
}

impl FromStr for BookshelfSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "updated_at" => Ok(Self::UpdatedAt),
            "added_at" => Ok(Self::AddedAt),
            "story_title" => Ok(Self::StoryTitle),
            "chapter_number" => Ok(Self::ChapterNumber),
            other => Err(format!(
                "Unknown sort_by '{other}', expected one of updated_at, added_at, story_title, chapter_number"
            )),
        }
    }
}

/// A bookshelf entry joined with the current story title and last-read
/// chapter. The joined columns are `None` when the target row is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct BookshelfRow {
    pub id: Uuid,
    pub story_id: Uuid,
    pub last_chapter_id: Option<Uuid>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub story_title: Option<String>,
    pub chapter_number: Option<i32>,
    pub chapter_title: Option<String>,
}

pub struct BookshelfRepository {
    conn: DatabaseConnection,
}

impl BookshelfRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find(
        &self,
        user_id: Uuid,
        story_id: Uuid,
    ) -> Result<Option<bookshelf_items::Model>> {
        BookshelfItems::find()
            .filter(bookshelf_items::Column::UserId.eq(user_id))
            .filter(bookshelf_items::Column::StoryId.eq(story_id))
            .one(&self.conn)
            .await
            .context("Failed to query bookshelf entry")
    }

    /// Plain insert; a second row for the same pair trips the unique index.
    pub async fn insert(
        &self,
        user_id: Uuid,
        story_id: Uuid,
        last_chapter_id: Option<Uuid>,
    ) -> Result<bookshelf_items::Model> {
        let now = Utc::now();
        bookshelf_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            story_id: Set(story_id),
            last_chapter_id: Set(last_chapter_id),
            added_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert bookshelf entry")
    }

    /// Single-statement insert-or-overwrite keyed on (user_id, story_id).
    /// `added_at` survives an overwrite.
    pub async fn upsert_last_chapter(
        &self,
        user_id: Uuid,
        story_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<bookshelf_items::Model> {
        let now = Utc::now();
        let entry = bookshelf_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            story_id: Set(story_id),
            last_chapter_id: Set(Some(chapter_id)),
            added_at: Set(now),
            updated_at: Set(now),
        };

        BookshelfItems::insert(entry)
            .on_conflict(
                OnConflict::columns([
                    bookshelf_items::Column::UserId,
                    bookshelf_items::Column::StoryId,
                ])
                .update_columns([
                    bookshelf_items::Column::LastChapterId,
                    bookshelf_items::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to upsert bookshelf entry")?;

        self.find(user_id, story_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Bookshelf entry missing right after upsert"))
    }

    pub async fn remove(&self, user_id: Uuid, story_id: Uuid) -> Result<u64> {
        let result = BookshelfItems::delete_many()
            .filter(bookshelf_items::Column::UserId.eq(user_id))
            .filter(bookshelf_items::Column::StoryId.eq(story_id))
            .exec(&self.conn)
            .await
            .context("Failed to remove bookshelf entry")?;

        Ok(result.rows_affected)
    }

    pub async fn delete_for_story(&self, story_id: Uuid) -> Result<u64> {
        let result = BookshelfItems::delete_many()
            .filter(bookshelf_items::Column::StoryId.eq(story_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete bookshelf entries for story")?;

        Ok(result.rows_affected)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        page: Page,
        sort: BookshelfSort,
        order: SortOrder,
    ) -> Result<(Vec<BookshelfRow>, u64)> {
        let total = BookshelfItems::find()
            .filter(bookshelf_items::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count bookshelf entries")?;

        let order = if order.is_ascending() {
            Order::Asc
        } else {
            Order::Desc
        };

        let query = BookshelfItems::find()
            .select_only()
            .column(bookshelf_items::Column::Id)
            .column(bookshelf_items::Column::StoryId)
            .column(bookshelf_items::Column::LastChapterId)
            .column(bookshelf_items::Column::AddedAt)
            .column(bookshelf_items::Column::UpdatedAt)
            .column_as(stories::Column::Title, "story_title")
            .column_as(chapters::Column::ChapterNumber, "chapter_number")
            .column_as(chapters::Column::Title, "chapter_title")
            .join(
                JoinType::LeftJoin,
                BookshelfItems::belongs_to(Stories)
                    .from(bookshelf_items::Column::StoryId)
                    .to(stories::Column::Id)
                    .into(),
            )
            .join(
                JoinType::LeftJoin,
                BookshelfItems::belongs_to(Chapters)
                    .from(bookshelf_items::Column::LastChapterId)
                    .to(chapters::Column::Id)
                    .into(),
            )
            .filter(bookshelf_items::Column::UserId.eq(user_id));

        let query = match sort {
            BookshelfSort::UpdatedAt => query.order_by(bookshelf_items::Column::UpdatedAt, order),
            BookshelfSort::AddedAt => query.order_by(bookshelf_items::Column::AddedAt, order),
            BookshelfSort::StoryTitle => query.order_by(stories::Column::Title, order),
            BookshelfSort::ChapterNumber => query.order_by(chapters::Column::ChapterNumber, order),
        };

        let rows = query
            .order_by_asc(bookshelf_items::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .into_model::<BookshelfRow>()
            .all(&self.conn)
            .await
            .context("Failed to list bookshelf entries")?;

        Ok((rows, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parses_known_values() {
        assert_eq!(
            "story_title".parse::<BookshelfSort>(),
            Ok(BookshelfSort::StoryTitle)
        );
        assert_eq!(
            "chapter_number".parse::<BookshelfSort>(),
            Ok(BookshelfSort::ChapterNumber)
        );
        assert!("title".parse::<BookshelfSort>().is_err());
    }
}
