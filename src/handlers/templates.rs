// src/handlers/templates.rs
use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::Template;
use crate::services::TemplateService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    #[serde(default)]
    pub enabled: bool,
}

pub fn template_routes() -> Router {
    Router::new().route("/api/templates", get(list_templates))
}

/// GET /api/templates?enabled=true
pub async fn list_templates(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<TemplateQuery>, QueryRejection>,
) -> Result<Json<Vec<Template>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(TemplateService::list(&state.db_pool, query.enabled).await?))
}
