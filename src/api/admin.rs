//! Moderation endpoints. Every route here sits behind `require_admin`.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{parse_role, parse_status};
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::Identity;
use crate::services::UserInfo;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

/// PUT /admin/stories/{title}/ban
pub async fn ban_story(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.shared.story_service.ban_story(&title).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Story '{title}' banned"
    )))))
}

/// PUT /admin/stories/{title}/unban
pub async fn unban_story(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.shared.story_service.unban_story(&title).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Story '{title}' unbanned"
    )))))
}

/// PUT /admin/users/{username}/role
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
    Json(payload): Json<RoleRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let role = parse_role(&payload.role)?;

    if identity.username == username {
        return Err(ApiError::validation("Admins cannot change their own role"));
    }

    let user = state.shared.auth_service.set_role(&username, role).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /admin/users/{username}/status
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let status = parse_status(&payload.status)?;

    if identity.username == username {
        return Err(ApiError::validation("Admins cannot change their own status"));
    }

    let user = state
        .shared
        .auth_service
        .set_status(&username, status)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}
