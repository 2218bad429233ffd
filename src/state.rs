use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, AuthorizationGuard, BookshelfService, ChapterService, CommentService, FollowUps,
    SeaOrmAuthService, SeaOrmBookshelfService, SeaOrmChapterService, SeaOrmCommentService,
    SeaOrmStoryService, StoryService, TokenService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenService>,

    pub guard: Arc<AuthorizationGuard>,

    pub auth_service: Arc<dyn AuthService>,

    pub story_service: Arc<dyn StoryService>,

    pub chapter_service: Arc<dyn ChapterService>,

    pub comment_service: Arc<dyn CommentService>,

    pub bookshelf_service: Arc<dyn BookshelfService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?
        .with_operation_timeout(Duration::from_secs(
            config.database.operation_timeout_seconds,
        ));

        let tokens = Arc::new(TokenService::from_config(&config.security));
        let guard = Arc::new(AuthorizationGuard::new(store.clone(), tokens.clone()));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let story_service = Arc::new(SeaOrmStoryService::new(
            store.clone(),
            Duration::from_secs(config.database.export_timeout_seconds),
        )) as Arc<dyn StoryService>;

        let chapter_service = Arc::new(SeaOrmChapterService::new(
            store.clone(),
            FollowUps::new(store.clone()),
        )) as Arc<dyn ChapterService>;

        let comment_service =
            Arc::new(SeaOrmCommentService::new(store.clone())) as Arc<dyn CommentService>;

        let bookshelf_service =
            Arc::new(SeaOrmBookshelfService::new(store.clone())) as Arc<dyn BookshelfService>;

        if let Some(admin) = &config.security.bootstrap_admin
            && auth_service
                .ensure_admin(&admin.username, &admin.password)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to seed admin account: {e}"))?
        {
            info!(username = %admin.username, "Seeded bootstrap admin account");
        }

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            guard,
            auth_service,
            story_service,
            chapter_service,
            comment_service,
            bookshelf_service,
        })
    }
}
