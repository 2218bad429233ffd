use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::parse_id;
use super::{ApiError, ApiResponse, AppState, CommentDto, PageDto, PageQuery};
use crate::domain::{Identity, Page};

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    #[serde(default)]
    pub story_id: String,
    #[serde(default)]
    pub chapter_id: String,
    #[serde(default)]
    pub content: String,
}

/// POST /stories/chapters/comment
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let story_id = parse_id("story", &payload.story_id)?;
    let chapter_id = parse_id("chapter", &payload.chapter_id)?;

    let comment = state
        .shared
        .comment_service
        .add_comment(&identity, story_id, chapter_id, &payload.content)
        .await?;

    Ok(Json(ApiResponse::success(comment.into())))
}

/// GET /stories/chapters/comments/{id}?page=&limit=
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(chapter_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<PageDto<CommentDto>>>, ApiError> {
    let chapter_id = parse_id("chapter", &chapter_id)?;
    let page = Page::clamped(query.page, query.limit);

    let (comments, total) = state
        .shared
        .comment_service
        .list_comments(chapter_id, page)
        .await?;

    Ok(Json(ApiResponse::success(PageDto {
        page: page.page,
        limit: page.limit,
        total,
        items: comments.into_iter().map(CommentDto::from).collect(),
    })))
}
