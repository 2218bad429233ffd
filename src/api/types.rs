use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{chapters, comments, stories};
use crate::services::{ChapterWithNeighbours, StoryExport, StoryWithLatest};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageDto<T> {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub items: Vec<T>,
}

/// `page`/`limit` query pair shared by the paginated listings. Kept as raw
/// integers so that out-of-range values can fall back to defaults instead of
/// failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StoryDto {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub genres: Vec<String>,
    pub cover_url: Option<String>,
    pub status: String,
    pub chapters_count: i64,
    pub view_count: i64,
    pub is_featured: bool,
    pub is_hidden: bool,
    pub is_banned: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<stories::Model> for StoryDto {
    fn from(story: stories::Model) -> Self {
        Self {
            genres: story.genre_list(),
            id: story.id,
            title: story.title,
            author: story.author,
            description: story.description,
            cover_url: story.cover_url,
            status: story.status,
            chapters_count: story.chapters_count,
            view_count: story.view_count,
            is_featured: story.is_featured,
            is_hidden: story.is_hidden,
            is_banned: story.is_banned,
            deleted_at: story.deleted_at,
            created_by: story.created_by,
            created_at: story.created_at,
            updated_at: story.updated_at,
        }
    }
}

/// Chapter without its body, for listings and neighbour links.
#[derive(Debug, Serialize)]
pub struct ChapterSummaryDto {
    pub id: Uuid,
    pub story_id: Uuid,
    pub chapter_number: i32,
    pub title: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<chapters::Model> for ChapterSummaryDto {
    fn from(chapter: chapters::Model) -> Self {
        Self {
            id: chapter.id,
            story_id: chapter.story_id,
            chapter_number: chapter.chapter_number,
            title: chapter.title,
            view_count: chapter.view_count,
            created_at: chapter.created_at,
            updated_at: chapter.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChapterDto {
    pub id: Uuid,
    pub story_id: Uuid,
    pub chapter_number: i32,
    pub title: String,
    pub content: String,
    pub view_count: i64,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<chapters::Model> for ChapterDto {
    fn from(chapter: chapters::Model) -> Self {
        Self {
            id: chapter.id,
            story_id: chapter.story_id,
            chapter_number: chapter.chapter_number,
            title: chapter.title,
            content: chapter.content,
            view_count: chapter.view_count,
            is_hidden: chapter.is_hidden,
            created_at: chapter.created_at,
            updated_at: chapter.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChapterReadDto {
    #[serde(flatten)]
    pub chapter: ChapterDto,
    pub previous: Option<ChapterSummaryDto>,
    pub next: Option<ChapterSummaryDto>,
}

impl From<ChapterWithNeighbours> for ChapterReadDto {
    fn from(read: ChapterWithNeighbours) -> Self {
        Self {
            chapter: read.chapter.into(),
            previous: read.previous.map(Into::into),
            next: read.next.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LatestStoryDto {
    #[serde(flatten)]
    pub story: StoryDto,
    pub latest_chapter: Option<ChapterSummaryDto>,
}

impl From<StoryWithLatest> for LatestStoryDto {
    fn from(entry: StoryWithLatest) -> Self {
        Self {
            story: entry.story.into(),
            latest_chapter: entry.latest_chapter.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoryExportDto {
    pub story: StoryDto,
    pub chapters: Vec<ChapterDto>,
}

impl From<StoryExport> for StoryExportDto {
    fn from(export: StoryExport) -> Self {
        Self {
            story: export.story.into(),
            chapters: export.chapters.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentDto {
    pub id: Uuid,
    pub story_id: Uuid,
    pub chapter_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<comments::Model> for CommentDto {
    fn from(comment: comments::Model) -> Self {
        Self {
            id: comment.id,
            story_id: comment.story_id,
            chapter_id: comment.chapter_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookshelfItemDto {
    pub id: Uuid,
    pub story_id: Uuid,
    pub last_chapter_id: Option<Uuid>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entities::bookshelf_items::Model> for BookshelfItemDto {
    fn from(item: crate::entities::bookshelf_items::Model) -> Self {
        Self {
            id: item.id,
            story_id: item.story_id,
            last_chapter_id: item.last_chapter_id,
            added_at: item.added_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
    pub uptime_seconds: u64,
}
