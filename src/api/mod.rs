use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod admin;
pub mod auth;
mod bookshelf;
mod chapters;
mod comments;
mod error;
mod observability;
mod stories;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(create_public_router())
        .merge(create_protected_router(state.clone()))
        .merge(create_admin_router(state.clone()))
        .route_layer(middleware::from_fn(observability::logging_middleware))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(system::health))
        .route("/users/register", post(auth::register))
        .route("/users/auth/login", post(auth::login))
        .route("/stories", get(stories::list_stories))
        .route("/stories/search", get(stories::search_stories))
        .route("/stories/filter", get(stories::filter_stories))
        .route("/stories/ranking", get(stories::ranking))
        .route("/stories/featured", get(stories::featured))
        .route("/stories/latest", get(stories::latest))
        .route("/stories/genres", get(stories::genres))
        .route("/stories/{id}", get(stories::get_story))
        .route("/stories/{id}/chapters", get(stories::list_chapters))
        .route("/stories/{id}/export", get(stories::export_story))
        .route(
            "/stories/chapters/{id}/{number}",
            get(chapters::read_by_number),
        )
        .route("/stories/chapters/id/{id}", get(chapters::read_by_id))
        .route(
            "/stories/chapters/comments/{id}",
            get(comments::list_comments),
        )
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(auth::me))
        .route("/users/me/stories", get(auth::my_stories))
        .route("/stories", post(stories::create_story))
        .route("/stories/{id}", put(stories::update_story))
        .route("/stories/{id}", delete(stories::delete_story))
        .route("/my-stories/{title}", delete(stories::delete_my_story))
        .route("/stories/chapters", post(chapters::create_chapter))
        .route("/stories/chapters/{id}", put(chapters::update_chapter))
        .route("/stories/chapters/{id}", delete(chapters::delete_chapter))
        .route("/stories/chapters/comment", post(comments::add_comment))
        .route("/bookshelf", get(bookshelf::list))
        .route("/bookshelf", post(bookshelf::add))
        .route(
            "/bookshelf/last-chapter",
            put(bookshelf::update_last_chapter),
        )
        .route("/bookshelf/{id}", delete(bookshelf::remove))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_identity,
        ))
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/stories/{title}/ban", put(admin::ban_story))
        .route("/admin/stories/{title}/unban", put(admin::unban_story))
        .route("/admin/users/{username}/role", put(admin::set_role))
        .route("/admin/users/{username}/status", put(admin::set_status))
        .route("/admin/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_identity,
        ))
}
