use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{parse_bookshelf_sort, parse_id, parse_sort_order};
use super::{ApiError, ApiResponse, AppState, BookshelfItemDto, MessageResponse};
use crate::domain::{Identity, Page};
use crate::services::BookshelfPage;

#[derive(Debug, Deserialize)]
pub struct BookshelfQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddToBookshelfRequest {
    #[serde(default)]
    pub story_id: String,
    pub last_chapter_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LastChapterRequest {
    #[serde(default)]
    pub story_id: String,
    #[serde(default)]
    pub chapter_id: String,
}

/// GET /bookshelf
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<BookshelfQuery>,
) -> Result<Json<ApiResponse<BookshelfPage>>, ApiError> {
    let page = Page::clamped(query.page, query.limit);
    let sort = parse_bookshelf_sort(query.sort_by.as_deref())?;
    let order = parse_sort_order(query.sort_order.as_deref())?;

    let shelf = state
        .shared
        .bookshelf_service
        .list(identity.id, page, sort, order)
        .await?;

    Ok(Json(ApiResponse::success(shelf)))
}

/// POST /bookshelf
pub async fn add(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<AddToBookshelfRequest>,
) -> Result<Json<ApiResponse<BookshelfItemDto>>, ApiError> {
    let story_id = parse_id("story", &payload.story_id)?;
    let last_chapter_id = payload
        .last_chapter_id
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_id("chapter", raw))
        .transpose()?;

    let item = state
        .shared
        .bookshelf_service
        .add(identity.id, story_id, last_chapter_id)
        .await?;

    Ok(Json(ApiResponse::success(item.into())))
}

/// PUT /bookshelf/last-chapter
pub async fn update_last_chapter(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<LastChapterRequest>,
) -> Result<Json<ApiResponse<BookshelfItemDto>>, ApiError> {
    let story_id = parse_id("story", &payload.story_id)?;
    let chapter_id = parse_id("chapter", &payload.chapter_id)?;

    let item = state
        .shared
        .bookshelf_service
        .update_last_chapter(identity.id, story_id, chapter_id)
        .await?;

    Ok(Json(ApiResponse::success(item.into())))
}

/// DELETE /bookshelf/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(story_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let story_id = parse_id("story", &story_id)?;

    state
        .shared
        .bookshelf_service
        .remove(identity.id, story_id)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Removed from bookshelf",
    ))))
}
