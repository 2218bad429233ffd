use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{clamp_limit, parse_id, parse_story_sort, validate_search_query};
use super::{
    ApiError, ApiResponse, AppState, ChapterSummaryDto, LatestStoryDto, MessageResponse, PageDto,
    StoryDto, StoryExportDto,
};
use crate::db::{GenreCount, StoryFilter};
use crate::domain::{Identity, Page, Role, StoryRef};
use crate::services::{CascadeReport, NewStory, StoryChanges};

#[derive(Debug, Deserialize)]
pub struct CreateStoryRequest {
    #[serde(default)]
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub cover_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStoryRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub genres: Option<Vec<String>>,
    pub cover_url: Option<String>,
    pub status: Option<String>,
    pub is_hidden: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub genre: Option<String>,
    pub status: Option<String>,
    pub author: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

fn to_dtos(stories: Vec<crate::entities::stories::Model>) -> Vec<StoryDto> {
    stories.into_iter().map(StoryDto::from).collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// GET /stories
pub async fn list_stories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<StoryDto>>>, ApiError> {
    let stories = state.shared.story_service.list_stories().await?;
    Ok(Json(ApiResponse::success(to_dtos(stories))))
}

/// GET /stories/search?name=
pub async fn search_stories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<StoryDto>>>, ApiError> {
    let name = validate_search_query(&query.name)?;
    let stories = state.shared.story_service.search_stories(name).await?;
    Ok(Json(ApiResponse::success(to_dtos(stories))))
}

/// GET /stories/filter
pub async fn filter_stories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ApiResponse<PageDto<StoryDto>>>, ApiError> {
    let page = Page::clamped(query.page, query.limit);
    let filter = StoryFilter {
        sort: parse_story_sort(query.sort.as_deref())?,
        genre: non_empty(query.genre),
        status: non_empty(query.status),
        author: non_empty(query.author),
    };

    let (stories, total) = state
        .shared
        .story_service
        .filter_stories(&filter, page)
        .await?;

    Ok(Json(ApiResponse::success(PageDto {
        page: page.page,
        limit: page.limit,
        total,
        items: to_dtos(stories),
    })))
}

/// GET /stories/ranking?limit=
pub async fn ranking(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<StoryDto>>>, ApiError> {
    let stories = state
        .shared
        .story_service
        .ranking(clamp_limit(query.limit))
        .await?;
    Ok(Json(ApiResponse::success(to_dtos(stories))))
}

/// GET /stories/featured
pub async fn featured(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<StoryDto>>>, ApiError> {
    let stories = state.shared.story_service.featured().await?;
    Ok(Json(ApiResponse::success(to_dtos(stories))))
}

/// GET /stories/latest?limit=
pub async fn latest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<LatestStoryDto>>>, ApiError> {
    let entries = state
        .shared
        .story_service
        .latest(clamp_limit(query.limit))
        .await?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(LatestStoryDto::from).collect(),
    )))
}

/// GET /stories/genres
pub async fn genres(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<GenreCount>>>, ApiError> {
    let counts = state.shared.story_service.genre_counts().await?;
    Ok(Json(ApiResponse::success(counts)))
}

/// GET /stories/{id}
pub async fn get_story(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoryDto>>, ApiError> {
    let id = parse_id("story", &id)?;
    let story = state.shared.story_service.get_story(id).await?;
    Ok(Json(ApiResponse::success(story.into())))
}

/// GET /stories/{id}/chapters
pub async fn list_chapters(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ChapterSummaryDto>>>, ApiError> {
    let id = parse_id("story", &id)?;
    let chapters = state.shared.story_service.list_chapters(id).await?;

    Ok(Json(ApiResponse::success(
        chapters.into_iter().map(ChapterSummaryDto::from).collect(),
    )))
}

/// GET /stories/{id}/export
pub async fn export_story(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoryExportDto>>, ApiError> {
    let id = parse_id("story", &id)?;
    let export = state.shared.story_service.export_story(id).await?;
    Ok(Json(ApiResponse::success(export.into())))
}

/// POST /stories
pub async fn create_story(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateStoryRequest>,
) -> Result<Json<ApiResponse<StoryDto>>, ApiError> {
    state.shared.guard.require_role(&identity, &[Role::Author])?;

    let story = state
        .shared
        .story_service
        .create_story(
            &identity,
            NewStory {
                title: payload.title,
                author: payload.author,
                description: payload.description,
                genres: payload.genres,
                cover_url: payload.cover_url,
                status: payload.status,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(story.into())))
}

/// PUT /stories/{id}
pub async fn update_story(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStoryRequest>,
) -> Result<Json<ApiResponse<StoryDto>>, ApiError> {
    let id = parse_id("story", &id)?;
    state
        .shared
        .guard
        .require_owner_of_story(&identity, &StoryRef::Id(id))
        .await?;

    let changes = StoryChanges {
        title: payload.title,
        author: payload.author,
        description: payload.description,
        genres: payload.genres,
        cover_url: payload.cover_url,
        status: payload.status,
        is_hidden: payload.is_hidden,
        is_featured: payload.is_featured,
    };

    let story = state
        .shared
        .story_service
        .update_story(&identity, id, changes)
        .await?;

    Ok(Json(ApiResponse::success(story.into())))
}

/// DELETE /stories/{id}
pub async fn delete_story(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CascadeReport>>, ApiError> {
    let id = parse_id("story", &id)?;
    state
        .shared
        .guard
        .require_owner_of_story(&identity, &StoryRef::Id(id))
        .await?;

    let report = state.shared.story_service.delete_story(id).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// DELETE /my-stories/{title}
pub async fn delete_my_story(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(title): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .story_service
        .delete_story_by_author(&identity, &title)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Story '{title}' deleted"
    )))))
}
