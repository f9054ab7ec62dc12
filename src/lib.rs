// src/lib.rs
use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod chat_filter;
pub mod config;
pub mod db;
pub mod error;
pub mod grouping;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;
pub mod threads;
pub mod upload;

use storage::ImageStore;
use upload::UploadPolicy;

/// Shared by every handler through `Extension<Arc<AppState>>`.
pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub image_store: Arc<dyn ImageStore>,
    pub storage_configured: bool,
    pub upload_policy: UploadPolicy,
}

pub fn app(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(handlers::status::status_routes())
        .merge(handlers::app_status::app_status_routes())
        .merge(handlers::chats::chat_routes())
        .merge(handlers::requests::request_routes())
        .merge(handlers::responses::response_routes())
        .merge(handlers::client_queries::client_query_routes())
        .merge(handlers::templates::template_routes())
        .merge(handlers::uploads::upload_routes(max_upload_bytes))
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
