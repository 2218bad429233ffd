use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, StoryDto};
use crate::domain::Identity;
use crate::services::{LoginResult, UserInfo};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Resolves the bearer token to a live account and makes the [`Identity`]
/// available to handlers as an extension.
pub async fn require_identity(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers());
    let identity = state.shared.guard.authenticate(token).await?;

    tracing::Span::current().record("user_id", tracing::field::display(identity.id));
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Must run after [`require_identity`].
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    state.shared.guard.require_admin(identity)?;

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

/// POST /users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state
        .shared
        .auth_service
        .register(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /users/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .shared
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// GET /users/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state.shared.auth_service.get_user(identity.id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// GET /users/me/stories
/// Includes hidden and banned stories; the caller owns them.
pub async fn my_stories(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<StoryDto>>>, ApiError> {
    let stories = state
        .shared
        .story_service
        .stories_by_creator(identity.id)
        .await?;

    Ok(Json(ApiResponse::success(
        stories.into_iter().map(StoryDto::from).collect(),
    )))
}
