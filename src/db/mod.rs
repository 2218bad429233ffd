use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Page, Role, SortOrder, UserStatus};
use crate::entities::{bookshelf_items, chapters, comments, stories, users};

pub mod migrator;
pub mod repositories;

pub use repositories::bookshelf::{BookshelfRow, BookshelfSort};
pub use repositories::story::{GenreCount, StoryFilter, StorySort};

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure of a single store call, as seen by the services.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store operation '{operation}' timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    #[error("Duplicate key in '{operation}'")]
    Duplicate { operation: &'static str },

    #[error("Store operation '{operation}' failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    fn from_anyhow(operation: &'static str, err: &anyhow::Error) -> Self {
        let unique_violation = err.chain().any(|cause| {
            cause
                .downcast_ref::<DbErr>()
                .and_then(DbErr::sql_err)
                .is_some_and(|sql| matches!(sql, SqlErr::UniqueConstraintViolation(_)))
        });

        if unique_violation {
            Self::Duplicate { operation }
        } else {
            Self::Backend {
                operation,
                message: format!("{err:#}"),
            }
        }
    }

    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Every public method runs under the configured operation timeout. A call
/// that overruns is abandoned and reported as [`StoreError::Timeout`].
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    operation_timeout: Duration,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self {
            conn,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        })
    }

    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.bounded_for(operation, self.operation_timeout, fut)
            .await
    }

    async fn bounded_for<T, F>(
        &self,
        operation: &'static str,
        limit: Duration,
        fut: F,
    ) -> StoreResult<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(StoreError::from_anyhow(operation, &err)),
            Err(_) => {
                warn!(operation, timeout_secs = limit.as_secs(), "Store operation timed out");
                metrics::counter!("store_timeouts_total", "operation" => operation).increment(1);
                Err(StoreError::Timeout {
                    operation,
                    seconds: limit.as_secs(),
                })
            }
        }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.bounded("ping", async {
            let backend = self.conn.get_database_backend();
            self.conn
                .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
                .await?;
            Ok::<(), anyhow::Error>(())
        })
        .await
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn story_repo(&self) -> repositories::story::StoryRepository {
        repositories::story::StoryRepository::new(self.conn.clone())
    }

    fn chapter_repo(&self) -> repositories::chapter::ChapterRepository {
        repositories::chapter::ChapterRepository::new(self.conn.clone())
    }

    fn comment_repo(&self) -> repositories::comment::CommentRepository {
        repositories::comment::CommentRepository::new(self.conn.clone())
    }

    fn bookshelf_repo(&self) -> repositories::bookshelf::BookshelfRepository {
        repositories::bookshelf::BookshelfRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: String,
        role: Role,
        status: UserStatus,
    ) -> StoreResult<users::Model> {
        self.bounded(
            "create_user",
            self.user_repo()
                .create(username, password_hash, role, status),
        )
        .await
    }

    pub async fn get_user(&self, id: Uuid) -> StoreResult<Option<users::Model>> {
        self.bounded("get_user", self.user_repo().get_by_id(id))
            .await
    }

    pub async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<users::Model>> {
        self.bounded(
            "get_user_by_username",
            self.user_repo().get_by_username(username),
        )
        .await
    }

    pub async fn set_user_role(&self, username: &str, role: Role) -> StoreResult<bool> {
        self.bounded("set_user_role", self.user_repo().set_role(username, role))
            .await
    }

    pub async fn set_user_status(&self, username: &str, status: UserStatus) -> StoreResult<bool> {
        self.bounded(
            "set_user_status",
            self.user_repo().set_status(username, status),
        )
        .await
    }

    // ========== Stories ==========

    pub async fn insert_story(&self, story: stories::ActiveModel) -> StoreResult<stories::Model> {
        self.bounded("insert_story", self.story_repo().insert(story))
            .await
    }

    pub async fn update_story(&self, story: stories::ActiveModel) -> StoreResult<stories::Model> {
        self.bounded("update_story", self.story_repo().update(story))
            .await
    }

    pub async fn get_story(&self, id: Uuid) -> StoreResult<Option<stories::Model>> {
        self.bounded("get_story", self.story_repo().get(id)).await
    }

    pub async fn get_story_by_title(&self, title: &str) -> StoreResult<Option<stories::Model>> {
        self.bounded("get_story_by_title", self.story_repo().get_by_title(title))
            .await
    }

    pub async fn list_visible_stories(&self) -> StoreResult<Vec<stories::Model>> {
        self.bounded("list_visible_stories", self.story_repo().list_visible())
            .await
    }

    pub async fn search_stories(&self, needle: &str) -> StoreResult<Vec<stories::Model>> {
        self.bounded("search_stories", self.story_repo().search_by_title(needle))
            .await
    }

    pub async fn filter_stories(
        &self,
        filter: &StoryFilter,
        page: Page,
    ) -> StoreResult<(Vec<stories::Model>, u64)> {
        self.bounded("filter_stories", self.story_repo().filter(filter, page))
            .await
    }

    pub async fn top_stories_by_views(&self, limit: u64) -> StoreResult<Vec<stories::Model>> {
        self.bounded("top_stories_by_views", self.story_repo().top_by_views(limit))
            .await
    }

    pub async fn featured_stories(&self) -> StoreResult<Vec<stories::Model>> {
        self.bounded("featured_stories", self.story_repo().featured())
            .await
    }

    pub async fn recently_updated_stories(&self, limit: u64) -> StoreResult<Vec<stories::Model>> {
        self.bounded(
            "recently_updated_stories",
            self.story_repo().recently_updated(limit),
        )
        .await
    }

    pub async fn stories_by_creator(&self, user_id: Uuid) -> StoreResult<Vec<stories::Model>> {
        self.bounded("stories_by_creator", self.story_repo().by_creator(user_id))
            .await
    }

    pub async fn genre_counts(&self) -> StoreResult<Vec<GenreCount>> {
        self.bounded("genre_counts", self.story_repo().genre_counts())
            .await
    }

    pub async fn set_story_banned(&self, title: &str, banned: bool) -> StoreResult<bool> {
        self.bounded(
            "set_story_banned",
            self.story_repo().set_banned(title, banned),
        )
        .await
    }

    pub async fn adjust_story_chapter_count(&self, id: Uuid, delta: i64) -> StoreResult<u64> {
        self.bounded(
            "adjust_story_chapter_count",
            self.story_repo().adjust_chapter_count(id, delta),
        )
        .await
    }

    pub async fn increment_story_views(&self, id: Uuid) -> StoreResult<u64> {
        self.bounded(
            "increment_story_views",
            self.story_repo().increment_views(id),
        )
        .await
    }

    pub async fn delete_story(&self, id: Uuid) -> StoreResult<u64> {
        self.bounded("delete_story", self.story_repo().delete(id))
            .await
    }

    // ========== Chapters ==========

    pub async fn create_next_chapter(
        &self,
        story_id: Uuid,
        title: &str,
        content: &str,
    ) -> StoreResult<Option<chapters::Model>> {
        self.bounded(
            "create_next_chapter",
            self.chapter_repo().create_next(story_id, title, content),
        )
        .await
    }

    pub async fn get_chapter(&self, id: Uuid) -> StoreResult<Option<chapters::Model>> {
        self.bounded("get_chapter", self.chapter_repo().get(id))
            .await
    }

    pub async fn update_chapter(
        &self,
        chapter: chapters::ActiveModel,
    ) -> StoreResult<chapters::Model> {
        self.bounded("update_chapter", self.chapter_repo().update(chapter))
            .await
    }

    pub async fn list_visible_chapters(&self, story_id: Uuid) -> StoreResult<Vec<chapters::Model>> {
        self.bounded(
            "list_visible_chapters",
            self.chapter_repo().list_visible_for_story(story_id),
        )
        .await
    }

    /// Chapter listing for export, bounded by its own (longer) window.
    pub async fn export_chapters(
        &self,
        story_id: Uuid,
        limit: Duration,
    ) -> StoreResult<Vec<chapters::Model>> {
        self.bounded_for(
            "export_chapters",
            limit,
            self.chapter_repo().list_visible_for_story(story_id),
        )
        .await
    }

    pub async fn latest_visible_chapter(
        &self,
        story_id: Uuid,
    ) -> StoreResult<Option<chapters::Model>> {
        self.bounded(
            "latest_visible_chapter",
            self.chapter_repo().latest_visible_for_story(story_id),
        )
        .await
    }

    pub async fn count_chapters(&self, story_id: Uuid) -> StoreResult<u64> {
        self.bounded(
            "count_chapters",
            self.chapter_repo().count_for_story(story_id),
        )
        .await
    }

    pub async fn increment_chapter_views(
        &self,
        id: Uuid,
    ) -> StoreResult<Option<chapters::Model>> {
        self.bounded(
            "increment_chapter_views",
            self.chapter_repo().increment_views(id),
        )
        .await
    }

    pub async fn increment_chapter_views_by_number(
        &self,
        story_id: Uuid,
        number: i32,
    ) -> StoreResult<Option<chapters::Model>> {
        self.bounded(
            "increment_chapter_views_by_number",
            self.chapter_repo()
                .increment_views_by_number(story_id, number),
        )
        .await
    }

    pub async fn chapter_neighbours(
        &self,
        story_id: Uuid,
        number: i32,
    ) -> StoreResult<(Option<chapters::Model>, Option<chapters::Model>)> {
        self.bounded(
            "chapter_neighbours",
            self.chapter_repo().neighbours(story_id, number),
        )
        .await
    }

    pub async fn delete_chapter(&self, id: Uuid) -> StoreResult<u64> {
        self.bounded("delete_chapter", self.chapter_repo().delete(id))
            .await
    }

    pub async fn delete_chapters_for_story(&self, story_id: Uuid) -> StoreResult<u64> {
        self.bounded(
            "delete_chapters_for_story",
            self.chapter_repo().delete_for_story(story_id),
        )
        .await
    }

    // ========== Comments ==========

    pub async fn insert_comment(
        &self,
        story_id: Uuid,
        chapter_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> StoreResult<comments::Model> {
        self.bounded(
            "insert_comment",
            self.comment_repo()
                .insert(story_id, chapter_id, user_id, content),
        )
        .await
    }

    pub async fn list_comments(
        &self,
        chapter_id: Uuid,
        page: Page,
    ) -> StoreResult<(Vec<comments::Model>, u64)> {
        self.bounded(
            "list_comments",
            self.comment_repo().list_for_chapter(chapter_id, page),
        )
        .await
    }

    pub async fn delete_comments_for_story(&self, story_id: Uuid) -> StoreResult<u64> {
        self.bounded(
            "delete_comments_for_story",
            self.comment_repo().delete_for_story(story_id),
        )
        .await
    }

    // ========== Bookshelf ==========

    pub async fn find_bookshelf_entry(
        &self,
        user_id: Uuid,
        story_id: Uuid,
    ) -> StoreResult<Option<bookshelf_items::Model>> {
        self.bounded(
            "find_bookshelf_entry",
            self.bookshelf_repo().find(user_id, story_id),
        )
        .await
    }

    pub async fn insert_bookshelf_entry(
        &self,
        user_id: Uuid,
        story_id: Uuid,
        last_chapter_id: Option<Uuid>,
    ) -> StoreResult<bookshelf_items::Model> {
        self.bounded(
            "insert_bookshelf_entry",
            self.bookshelf_repo()
                .insert(user_id, story_id, last_chapter_id),
        )
        .await
    }

    pub async fn upsert_bookshelf_last_chapter(
        &self,
        user_id: Uuid,
        story_id: Uuid,
        chapter_id: Uuid,
    ) -> StoreResult<bookshelf_items::Model> {
        self.bounded(
            "upsert_bookshelf_last_chapter",
            self.bookshelf_repo()
                .upsert_last_chapter(user_id, story_id, chapter_id),
        )
        .await
    }

    pub async fn remove_bookshelf_entry(&self, user_id: Uuid, story_id: Uuid) -> StoreResult<u64> {
        self.bounded(
            "remove_bookshelf_entry",
            self.bookshelf_repo().remove(user_id, story_id),
        )
        .await
    }

    pub async fn delete_bookshelf_for_story(&self, story_id: Uuid) -> StoreResult<u64> {
        self.bounded(
            "delete_bookshelf_for_story",
            self.bookshelf_repo().delete_for_story(story_id),
        )
        .await
    }

    pub async fn list_bookshelf(
        &self,
        user_id: Uuid,
        page: Page,
        sort: BookshelfSort,
        order: SortOrder,
    ) -> StoreResult<(Vec<BookshelfRow>, u64)> {
        self.bounded(
            "list_bookshelf",
            self.bookshelf_repo().list(user_id, page, sort, order),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_reports_timeouts() {
        let store = Store::new("sqlite::memory:")
            .await
            .unwrap()
            .with_operation_timeout(Duration::from_millis(10));

        let result: StoreResult<()> = store
            .bounded("slow", async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<(), anyhow::Error>(())
            })
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Timeout {
                operation: "slow",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn backend_errors_keep_their_context() {
        let store = Store::new("sqlite::memory:").await.unwrap();

        let result: StoreResult<()> = store
            .bounded("broken", async { Err::<(), _>(anyhow::anyhow!("boom")) })
            .await;

        match result {
            Err(StoreError::Backend { operation, message }) => {
                assert_eq!(operation, "broken");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
