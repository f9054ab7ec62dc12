// src/handlers/requests.rs
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;

use super::{require_chat_id, ChatIdQuery};
use crate::error::ApiError;
use crate::models::chat::CreateRequestPayload;
use crate::models::Request;
use crate::services::RequestService;
use crate::AppState;

pub fn request_routes() -> Router {
    Router::new().route("/api/requests", get(list_requests).post(create_request))
}

/// GET /api/requests?chatId=
pub async fn list_requests(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<ChatIdQuery>, QueryRejection>,
) -> Result<Json<Vec<Request>>, ApiError> {
    let Query(query) = query?;
    let chat_id = require_chat_id(query.chat_id.as_deref())?;

    let requests = RequestService::list_for_chat(&state.db_pool, chat_id).await?;
    Ok(Json(requests))
}

/// POST /api/requests - a client asks something; the chat moves to in_progress
pub async fn create_request(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<CreateRequestPayload>, JsonRejection>,
) -> Result<Json<Request>, ApiError> {
    let Json(payload) = payload?;
    let chat_id = payload
        .chat_id
        .ok_or_else(|| ApiError::Validation("Chat ID is required".to_string()))?;

    let request = RequestService::create(
        &state.db_pool,
        chat_id,
        payload.prompt.as_deref().unwrap_or_default(),
        payload.image_url.as_deref(),
    )
    .await?;

    Ok(Json(request))
}
