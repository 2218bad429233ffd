//! `SeaORM` implementation of the `ChapterService` trait.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveValue::Set, IntoActiveModel};
use tracing::info;
use uuid::Uuid;

use crate::db::Store;
use crate::entities::{chapters, stories};
use crate::services::chapter_service::{
    ChapterChanges, ChapterService, ChapterWithNeighbours, ContentError,
};
use crate::services::follow_up::{FollowUps, SecondaryWrite};
use crate::services::story_service_impl::TITLE_MAX_LEN;

pub struct SeaOrmChapterService {
    store: Store,
    follow_ups: FollowUps,
}

impl SeaOrmChapterService {
    #[must_use]
    pub const fn new(store: Store, follow_ups: FollowUps) -> Self {
        Self { store, follow_ups }
    }

    async fn visible_story(&self, id: Uuid) -> Result<stories::Model, ContentError> {
        self.store
            .get_story(id)
            .await?
            .filter(stories::Model::is_visible)
            .ok_or_else(|| ContentError::story_not_found(id))
    }
}

fn clean_chapter_title(title: &str) -> Result<String, ContentError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ContentError::Validation(
            "Chapter title is required".to_string(),
        ));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(ContentError::Validation(format!(
            "Chapter title must be {TITLE_MAX_LEN} characters or less"
        )));
    }
    Ok(title.to_string())
}

fn check_content(content: &str) -> Result<(), ContentError> {
    if content.trim().is_empty() {
        return Err(ContentError::Validation(
            "Chapter content is required".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl ChapterService for SeaOrmChapterService {
    async fn create_chapter(
        &self,
        story_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<chapters::Model, ContentError> {
        let title = clean_chapter_title(title)?;
        check_content(content)?;

        let chapter = self
            .store
            .create_next_chapter(story_id, &title, content)
            .await?
            .ok_or_else(|| ContentError::story_not_found(story_id))?;

        info!(
            chapter_id = %chapter.id,
            story_id = %story_id,
            chapter_number = chapter.chapter_number,
            "Chapter created"
        );

        self.follow_ups
            .apply(SecondaryWrite::AdjustChapterCount { story_id, delta: 1 })
            .await;

        Ok(chapter)
    }

    async fn update_chapter(
        &self,
        id: Uuid,
        changes: ChapterChanges,
    ) -> Result<chapters::Model, ContentError> {
        let chapter = self
            .store
            .get_chapter(id)
            .await?
            .ok_or_else(|| ContentError::chapter_not_found(id))?;

        let mut active = chapter.into_active_model();
        if let Some(title) = changes.title {
            active.title = Set(clean_chapter_title(&title)?);
        }
        if let Some(content) = changes.content {
            check_content(&content)?;
            active.content = Set(content);
        }
        if let Some(is_hidden) = changes.is_hidden {
            active.is_hidden = Set(is_hidden);
        }
        active.updated_at = Set(Utc::now());

        Ok(self.store.update_chapter(active).await?)
    }

    async fn delete_chapter(&self, id: Uuid) -> Result<(), ContentError> {
        let chapter = self
            .store
            .get_chapter(id)
            .await?
            .ok_or_else(|| ContentError::chapter_not_found(id))?;

        if self.store.delete_chapter(id).await? == 0 {
            return Err(ContentError::chapter_not_found(id));
        }

        info!(chapter_id = %id, story_id = %chapter.story_id, "Chapter deleted");

        self.follow_ups
            .apply(SecondaryWrite::AdjustChapterCount {
                story_id: chapter.story_id,
                delta: -1,
            })
            .await;

        Ok(())
    }

    async fn read_by_story_and_number(
        &self,
        story_id: Uuid,
        number: i32,
    ) -> Result<chapters::Model, ContentError> {
        if number < 1 {
            return Err(ContentError::Validation(
                "Chapter number must be a positive integer".to_string(),
            ));
        }

        self.visible_story(story_id).await?;

        let chapter = self
            .store
            .increment_chapter_views_by_number(story_id, number)
            .await?
            .ok_or_else(|| {
                ContentError::NotFound(format!("Chapter {number} of story {story_id} not found"))
            })?;

        self.follow_ups
            .apply(SecondaryWrite::RecordStoryView { story_id })
            .await;

        Ok(chapter)
    }

    async fn read_by_id(&self, id: Uuid) -> Result<ChapterWithNeighbours, ContentError> {
        let current = self
            .store
            .get_chapter(id)
            .await?
            .filter(chapters::Model::is_visible)
            .ok_or_else(|| ContentError::chapter_not_found(id))?;

        self.visible_story(current.story_id).await?;

        let chapter = self
            .store
            .increment_chapter_views(id)
            .await?
            .ok_or_else(|| ContentError::chapter_not_found(id))?;

        self.follow_ups
            .apply(SecondaryWrite::RecordStoryView {
                story_id: chapter.story_id,
            })
            .await;

        let (previous, next) = self
            .store
            .chapter_neighbours(chapter.story_id, chapter.chapter_number)
            .await?;

        Ok(ChapterWithNeighbours {
            chapter,
            previous,
            next,
        })
    }
}
