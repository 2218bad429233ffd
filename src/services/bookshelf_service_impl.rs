//! `SeaORM` implementation of the `BookshelfService` trait.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::db::{BookshelfSort, Store};
use crate::domain::{Page, SortOrder};
use crate::entities::bookshelf_items;
use crate::services::bookshelf_service::{BookshelfError, BookshelfPage, BookshelfService};

pub struct SeaOrmBookshelfService {
    store: Store,
}

impl SeaOrmBookshelfService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn check_targets(
        &self,
        story_id: Uuid,
        chapter_id: Option<Uuid>,
    ) -> Result<(), BookshelfError> {
        if self.store.get_story(story_id).await?.is_none() {
            return Err(BookshelfError::NotFound(format!(
                "Story {story_id} not found"
            )));
        }

        if let Some(chapter_id) = chapter_id {
            let chapter = self.store.get_chapter(chapter_id).await?.ok_or_else(|| {
                BookshelfError::NotFound(format!("Chapter {chapter_id} not found"))
            })?;

            if chapter.story_id != story_id {
                return Err(BookshelfError::Validation(format!(
                    "Chapter {chapter_id} does not belong to story {story_id}"
                )));
            }
        }

        Ok(())
    }

    fn already_tracked(story_id: Uuid) -> BookshelfError {
        BookshelfError::Conflict(format!("Story {story_id} is already on the bookshelf"))
    }
}

#[async_trait]
impl BookshelfService for SeaOrmBookshelfService {
    async fn add(
        &self,
        user_id: Uuid,
        story_id: Uuid,
        last_chapter_id: Option<Uuid>,
    ) -> Result<bookshelf_items::Model, BookshelfError> {
        self.check_targets(story_id, last_chapter_id).await?;

        if self
            .store
            .find_bookshelf_entry(user_id, story_id)
            .await?
            .is_some()
        {
            return Err(Self::already_tracked(story_id));
        }

        // A concurrent add can still slip between the check and the insert;
        // the unique index turns that into the same conflict.
        let entry = self
            .store
            .insert_bookshelf_entry(user_id, story_id, last_chapter_id)
            .await
            .map_err(|e| {
                if e.is_duplicate() {
                    Self::already_tracked(story_id)
                } else {
                    BookshelfError::Store(e)
                }
            })?;

        info!(%user_id, %story_id, "Story added to bookshelf");
        Ok(entry)
    }

    async fn update_last_chapter(
        &self,
        user_id: Uuid,
        story_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<bookshelf_items::Model, BookshelfError> {
        self.check_targets(story_id, Some(chapter_id)).await?;

        Ok(self
            .store
            .upsert_bookshelf_last_chapter(user_id, story_id, chapter_id)
            .await?)
    }

    async fn remove(&self, user_id: Uuid, story_id: Uuid) -> Result<(), BookshelfError> {
        if self.store.remove_bookshelf_entry(user_id, story_id).await? == 0 {
            return Err(BookshelfError::NotFound(format!(
                "Story {story_id} is not on the bookshelf"
            )));
        }

        info!(%user_id, %story_id, "Story removed from bookshelf");
        Ok(())
    }

    async fn list(
        &self,
        user_id: Uuid,
        page: Page,
        sort: BookshelfSort,
        order: SortOrder,
    ) -> Result<BookshelfPage, BookshelfError> {
        let (items, total) = self.store.list_bookshelf(user_id, page, sort, order).await?;

        Ok(BookshelfPage {
            page: page.page,
            limit: page.limit,
            total,
            items,
        })
    }
}
