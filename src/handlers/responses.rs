// src/handlers/responses.rs
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
use crate::models::chat::CreateResponsePayload;
use crate::models::{NewResponse, Response};
use crate::services::ResponseService;
use crate::AppState;

pub fn response_routes() -> Router {
    Router::new().route("/api/responses", get(list_responses).post(create_response))
}

/// GET /api/responses?chatId=
pub async fn list_responses(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<ChatIdQuery>, QueryRejection>,
) -> Result<Json<Vec<Response>>, ApiError> {
    let Query(query) = query?;
    let chat_id = require_chat_id(query.chat_id.as_deref())?;

    let responses = ResponseService::list_for_chat(&state.db_pool, chat_id).await?;
    Ok(Json(responses))
}

/// POST /api/responses - image URLs already uploaded by the caller
pub async fn create_response(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<CreateResponsePayload>, JsonRejection>,
) -> Result<Json<Response>, ApiError> {
    let Json(payload) = payload?;
    let new = validate_new_response(payload, state.upload_policy.max_images)?;

    let response = ResponseService::create(&state.db_pool, new).await?;
    Ok(Json(response))
}

fn validate_new_response(payload: CreateResponsePayload, max_images: usize) -> Result<NewResponse, ApiError> {
    let chat_id = payload
        .chat_id
        .ok_or_else(|| ApiError::Validation("Chat ID is required".to_string()))?;
    let image_url = payload
        .image_url
        .ok_or_else(|| ApiError::Validation("Image URL array is required".to_string()))?;

    if image_url.len() > max_images {
        return Err(ApiError::Validation(format!("Maximum of {} images allowed.", max_images)));
    }

    Ok(NewResponse {
        chat_id,
        request_id: payload.request_id,
        message: payload.message.filter(|m| !m.trim().is_empty()),
        image_url,
    })
}
