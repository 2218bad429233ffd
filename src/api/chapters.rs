use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{parse_id, validate_chapter_number};
use super::{ApiError, ApiResponse, AppState, ChapterDto, ChapterReadDto, MessageResponse};
use crate::domain::{Identity, StoryRef};
use crate::services::ChapterChanges;

#[derive(Debug, Deserialize)]
pub struct CreateChapterRequest {
    #[serde(default)]
    pub story_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChapterRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_hidden: Option<bool>,
}

/// POST /stories/chapters
pub async fn create_chapter(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateChapterRequest>,
) -> Result<Json<ApiResponse<ChapterDto>>, ApiError> {
    if payload.story_id.trim().is_empty() {
        return Err(ApiError::validation("story_id is required"));
    }
    let story_id = parse_id("story", &payload.story_id)?;

    state
        .shared
        .guard
        .require_owner_of_story(&identity, &StoryRef::Id(story_id))
        .await?;

    let chapter = state
        .shared
        .chapter_service
        .create_chapter(story_id, &payload.title, &payload.content)
        .await?;

    Ok(Json(ApiResponse::success(chapter.into())))
}

/// PUT /stories/chapters/{id}
pub async fn update_chapter(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateChapterRequest>,
) -> Result<Json<ApiResponse<ChapterDto>>, ApiError> {
    let id = parse_id("chapter", &id)?;
    state
        .shared
        .guard
        .require_owner_of_chapter(&identity, id)
        .await?;

    let chapter = state
        .shared
        .chapter_service
        .update_chapter(
            id,
            ChapterChanges {
                title: payload.title,
                content: payload.content,
                is_hidden: payload.is_hidden,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(chapter.into())))
}

/// DELETE /stories/chapters/{id}
pub async fn delete_chapter(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = parse_id("chapter", &id)?;
    state
        .shared
        .guard
        .require_owner_of_chapter(&identity, id)
        .await?;

    state.shared.chapter_service.delete_chapter(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Chapter deleted",
    ))))
}

/// GET /stories/chapters/{id}/{number}
/// `id` is the story. Every successful read counts as a view.
pub async fn read_by_number(
    State(state): State<Arc<AppState>>,
    Path((story_id, number)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ChapterDto>>, ApiError> {
    let story_id = parse_id("story", &story_id)?;
    let number = number
        .trim()
        .parse::<i32>()
        .map_err(|_| ApiError::validation(format!("Invalid chapter number: '{number}'")))
        .and_then(validate_chapter_number)?;

    let chapter = state
        .shared
        .chapter_service
        .read_by_story_and_number(story_id, number)
        .await?;

    Ok(Json(ApiResponse::success(chapter.into())))
}

/// GET /stories/chapters/id/{id}
pub async fn read_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ChapterReadDto>>, ApiError> {
    let id = parse_id("chapter", &id)?;
    let read = state.shared.chapter_service.read_by_id(id).await?;
    Ok(Json(ApiResponse::success(read.into())))
}
