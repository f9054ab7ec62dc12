// src/handlers/app_status.rs
use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{AppStatus, UpdateAppStatusRequest};
use crate::services::{AppStatusService, CasOutcome};
use crate::AppState;

pub fn app_status_routes() -> Router {
    Router::new().route("/api/app-status", get(get_app_status).patch(update_app_status))
}

/// GET /api/app-status
pub async fn get_app_status(Extension(state): Extension<Arc<AppState>>) -> Result<Json<AppStatus>, ApiError> {
    AppStatusService::current(&state.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No app status found".to_string()))
}

/// PATCH /api/app-status - compare-and-set on (id, version)
pub async fn update_app_status(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<UpdateAppStatusRequest>, JsonRejection>,
) -> Result<Json<AppStatus>, ApiError> {
    let Json(payload) = payload?;
    let id = payload
        .id
        .ok_or_else(|| ApiError::Validation("App status ID is required".to_string()))?;
    let version = payload
        .version
        .ok_or_else(|| ApiError::Validation("App status version is required".to_string()))?;

    let outcome = AppStatusService::compare_and_set(
        &state.db_pool,
        id,
        version,
        payload.is_available,
        payload.status_message.as_deref(),
    )
    .await?;

    match outcome {
        CasOutcome::Updated(status) => Ok(Json(status)),
        CasOutcome::Stale(current) => Err(ApiError::Conflict(format!(
            "App status was changed by someone else (current version {})",
            current.version
        ))),
        CasOutcome::NotFound => Err(ApiError::NotFound("No app status found".to_string())),
    }
}
