//! `SeaORM` implementation of the `StoryService` trait.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveValue::Set, IntoActiveModel};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{GenreCount, Store, StoryFilter};
use crate::domain::policy::{Decision, Policy};
use crate::domain::{Identity, Page};
use crate::entities::{chapters, stories};
use crate::services::story_service::{
    CascadeReport, ContentError, NewStory, StoryChanges, StoryExport, StoryService,
    StoryWithLatest,
};

pub const TITLE_MAX_LEN: usize = 200;
const DEFAULT_STATUS: &str = "active";

pub struct SeaOrmStoryService {
    store: Store,
    export_timeout: Duration,
}

impl SeaOrmStoryService {
    #[must_use]
    pub const fn new(store: Store, export_timeout: Duration) -> Self {
        Self {
            store,
            export_timeout,
        }
    }

    async fn visible_story(&self, id: Uuid) -> Result<stories::Model, ContentError> {
        self.store
            .get_story(id)
            .await?
            .filter(stories::Model::is_visible)
            .ok_or_else(|| ContentError::story_not_found(id))
    }

    async fn cascade(&self, story: &stories::Model) -> Result<CascadeReport, ContentError> {
        let mut report = CascadeReport::default();

        report.bookshelf_entries = self.store.delete_bookshelf_for_story(story.id).await?;
        report.comments = self.store.delete_comments_for_story(story.id).await?;
        report.chapters = self.store.delete_chapters_for_story(story.id).await?;

        if self.store.delete_story(story.id).await? == 0 {
            warn!(story_id = %story.id, "Story row already gone at the end of cascade");
        }

        info!(
            story_id = %story.id,
            title = %story.title,
            bookshelf_entries = report.bookshelf_entries,
            comments = report.comments,
            chapters = report.chapters,
            "Story deleted"
        );

        Ok(report)
    }

    fn duplicate_title(title: &str) -> ContentError {
        ContentError::Conflict(format!("A story titled '{title}' already exists"))
    }
}

fn clean_title(title: &str) -> Result<String, ContentError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ContentError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(ContentError::Validation(format!(
            "Title must be {TITLE_MAX_LEN} characters or less"
        )));
    }
    Ok(title.to_string())
}

fn clean_genres(genres: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(genres.len());
    for genre in genres {
        let genre = genre.trim();
        if !genre.is_empty() && !cleaned.iter().any(|g| g == genre) {
            cleaned.push(genre.to_string());
        }
    }
    cleaned
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl StoryService for SeaOrmStoryService {
    async fn create_story(
        &self,
        creator: &Identity,
        story: NewStory,
    ) -> Result<stories::Model, ContentError> {
        let title = clean_title(&story.title)?;

        if self.store.get_story_by_title(&title).await?.is_some() {
            return Err(Self::duplicate_title(&title));
        }

        let now = Utc::now();
        let model = stories::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.clone()),
            author: Set(non_blank(story.author).unwrap_or_else(|| creator.username.clone())),
            description: Set(story.description.unwrap_or_default()),
            genres: Set(serde_json::json!(clean_genres(story.genres))),
            cover_url: Set(non_blank(story.cover_url)),
            status: Set(non_blank(story.status).unwrap_or_else(|| DEFAULT_STATUS.to_string())),
            chapters_count: Set(0),
            last_chapter_number: Set(0),
            view_count: Set(0),
            is_featured: Set(false),
            is_hidden: Set(false),
            is_banned: Set(false),
            deleted_at: Set(None),
            created_by: Set(creator.id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self.store.insert_story(model).await.map_err(|e| {
            if e.is_duplicate() {
                Self::duplicate_title(&title)
            } else {
                ContentError::Store(e)
            }
        })?;

        info!(story_id = %created.id, title = %created.title, user_id = %creator.id, "Story created");
        Ok(created)
    }

    async fn get_story(&self, id: Uuid) -> Result<stories::Model, ContentError> {
        self.visible_story(id).await
    }

    async fn list_stories(&self) -> Result<Vec<stories::Model>, ContentError> {
        Ok(self.store.list_visible_stories().await?)
    }

    async fn search_stories(&self, name: &str) -> Result<Vec<stories::Model>, ContentError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ContentError::Validation(
                "Search name cannot be empty".to_string(),
            ));
        }
        Ok(self.store.search_stories(name).await?)
    }

    async fn filter_stories(
        &self,
        filter: &StoryFilter,
        page: Page,
    ) -> Result<(Vec<stories::Model>, u64), ContentError> {
        Ok(self.store.filter_stories(filter, page).await?)
    }

    async fn ranking(&self, limit: u64) -> Result<Vec<stories::Model>, ContentError> {
        Ok(self.store.top_stories_by_views(limit).await?)
    }

    async fn featured(&self) -> Result<Vec<stories::Model>, ContentError> {
        Ok(self.store.featured_stories().await?)
    }

    async fn latest(&self, limit: u64) -> Result<Vec<StoryWithLatest>, ContentError> {
        let stories = self.store.recently_updated_stories(limit).await?;

        let mut result = Vec::with_capacity(stories.len());
        for story in stories {
            let latest_chapter = self.store.latest_visible_chapter(story.id).await?;
            result.push(StoryWithLatest {
                story,
                latest_chapter,
            });
        }

        Ok(result)
    }

    async fn genre_counts(&self) -> Result<Vec<GenreCount>, ContentError> {
        Ok(self.store.genre_counts().await?)
    }

    async fn stories_by_creator(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<stories::Model>, ContentError> {
        Ok(self.store.stories_by_creator(user_id).await?)
    }

    async fn list_chapters(&self, story_id: Uuid) -> Result<Vec<chapters::Model>, ContentError> {
        self.visible_story(story_id).await?;
        Ok(self.store.list_visible_chapters(story_id).await?)
    }

    async fn export_story(&self, story_id: Uuid) -> Result<StoryExport, ContentError> {
        let story = self.visible_story(story_id).await?;
        let chapters = self
            .store
            .export_chapters(story_id, self.export_timeout)
            .await?;

        Ok(StoryExport { story, chapters })
    }

    async fn update_story(
        &self,
        editor: &Identity,
        id: Uuid,
        changes: StoryChanges,
    ) -> Result<stories::Model, ContentError> {
        if changes.is_featured.is_some() && !Policy::Admin.evaluate(editor).is_allowed() {
            return Err(ContentError::Forbidden(
                "Only admins can feature stories".to_string(),
            ));
        }

        let story = self
            .store
            .get_story(id)
            .await?
            .ok_or_else(|| ContentError::story_not_found(id))?;

        if changes.is_empty() {
            return Ok(story);
        }

        let mut active = story.into_active_model();

        let mut new_title = None;
        if let Some(title) = changes.title {
            let title = clean_title(&title)?;
            active.title = Set(title.clone());
            new_title = Some(title);
        }
        if let Some(author) = non_blank(changes.author) {
            active.author = Set(author);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(genres) = changes.genres {
            active.genres = Set(serde_json::json!(clean_genres(genres)));
        }
        if let Some(cover_url) = changes.cover_url {
            active.cover_url = Set(non_blank(Some(cover_url)));
        }
        if let Some(status) = non_blank(changes.status) {
            active.status = Set(status);
        }
        if let Some(is_hidden) = changes.is_hidden {
            active.is_hidden = Set(is_hidden);
        }
        if let Some(is_featured) = changes.is_featured {
            active.is_featured = Set(is_featured);
        }
        active.updated_at = Set(Utc::now());

        let updated = self.store.update_story(active).await.map_err(|e| {
            if e.is_duplicate() {
                Self::duplicate_title(new_title.as_deref().unwrap_or_default())
            } else {
                ContentError::Store(e)
            }
        })?;

        info!(story_id = %updated.id, user_id = %editor.id, "Story updated");
        Ok(updated)
    }

    async fn delete_story(&self, id: Uuid) -> Result<CascadeReport, ContentError> {
        let story = self
            .store
            .get_story(id)
            .await?
            .ok_or_else(|| ContentError::story_not_found(id))?;

        self.cascade(&story).await
    }

    async fn ban_story(&self, title: &str) -> Result<(), ContentError> {
        if !self.store.set_story_banned(title, true).await? {
            return Err(ContentError::story_not_found(format!("'{title}'")));
        }
        info!(title, "Story banned");
        Ok(())
    }

    async fn unban_story(&self, title: &str) -> Result<(), ContentError> {
        if !self.store.set_story_banned(title, false).await? {
            return Err(ContentError::story_not_found(format!("'{title}'")));
        }
        info!(title, "Story unbanned");
        Ok(())
    }

    async fn delete_story_by_author(
        &self,
        identity: &Identity,
        title: &str,
    ) -> Result<CascadeReport, ContentError> {
        let story = self
            .store
            .get_story_by_title(title)
            .await?
            .ok_or_else(|| ContentError::story_not_found(format!("'{title}'")))?;

        // Strict ownership: the admin override does not open this path.
        let owner = Policy::Owner(story.created_by).evaluate(identity) == Decision::Allow;
        if !owner || !story.is_banned {
            return Err(ContentError::Forbidden(
                "Only the author of a banned story can delete it permanently".to_string(),
            ));
        }

        self.cascade(&story).await
    }
}
