pub mod auth_service;
pub mod auth_service_impl;
pub mod bookshelf_service;
pub mod bookshelf_service_impl;
pub mod chapter_service;
pub mod chapter_service_impl;
pub mod comment_service;
pub mod comment_service_impl;
pub mod follow_up;
pub mod guard;
pub mod story_service;
pub mod story_service_impl;
pub mod token;

pub use auth_service::{AuthError, AuthService, LoginResult, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub use bookshelf_service::{BookshelfError, BookshelfPage, BookshelfService};
pub use bookshelf_service_impl::SeaOrmBookshelfService;

pub use chapter_service::{ChapterChanges, ChapterService, ChapterWithNeighbours};
pub use chapter_service_impl::SeaOrmChapterService;

pub use comment_service::CommentService;
pub use comment_service_impl::SeaOrmCommentService;

pub use story_service::{
    CascadeReport, ContentError, NewStory, StoryChanges, StoryExport, StoryService,
    StoryWithLatest,
};
pub use story_service_impl::SeaOrmStoryService;

pub use follow_up::{FollowUpOutcome, FollowUps, SecondaryWrite};
pub use guard::AuthorizationGuard;
pub use token::{Claims, TokenService};
