//! Domain service for the per-user bookshelf.
//!
//! A (user, story) pair is either absent or tracked with an optional
//! last-read chapter. The unique index on the pair backs both transitions
//! that create rows:
//!
//! - [`BookshelfService::add`] rejects an existing pair with a conflict
//! - [`BookshelfService::update_last_chapter`] creates or overwrites in one
//!   upsert statement

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{BookshelfRow, BookshelfSort, StoreError};
use crate::domain::{Page, SortOrder};
use crate::entities::bookshelf_items;

#[derive(Debug, Error)]
pub enum BookshelfError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct BookshelfPage {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub items: Vec<BookshelfRow>,
}

#[async_trait::async_trait]
pub trait BookshelfService: Send + Sync {
    /// Absent to tracked.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Conflict`] if the story is already tracked,
    /// [`BookshelfError::NotFound`] if the story does not exist and
    /// [`BookshelfError::Validation`] if the chapter is not part of it.
    async fn add(
        &self,
        user_id: Uuid,
        story_id: Uuid,
        last_chapter_id: Option<Uuid>,
    ) -> Result<bookshelf_items::Model, BookshelfError>;

    /// Absent or tracked to tracked with `chapter_id` as the last read.
    async fn update_last_chapter(
        &self,
        user_id: Uuid,
        story_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<bookshelf_items::Model, BookshelfError>;

    /// Tracked to absent.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::NotFound`] if nothing was tracked.
    async fn remove(&self, user_id: Uuid, story_id: Uuid) -> Result<(), BookshelfError>;

    /// The user's entries joined with current story and chapter data. An
    /// empty shelf is an empty page, not an error.
    async fn list(
        &self,
        user_id: Uuid,
        page: Page,
        sort: BookshelfSort,
        order: SortOrder,
    ) -> Result<BookshelfPage, BookshelfError>;
}
