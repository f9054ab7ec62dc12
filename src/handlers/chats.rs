// src/handlers/chats.rs
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    response::Json,
    routing::{get, patch},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::chat_filter::{auto_select_candidate, filter_chats, ChatFilter, ChatQueueView, StatusFilter};
use crate::error::ApiError;
use crate::models::chat::{CreateChatRequest, UpdateChatRequest};
use crate::models::{Chat, ChatStatus, Request};
use crate::services::{ChatService, RequestService, ResponseService};
use crate::threads::{build_threads, latest_request, ConversationThread};
use crate::AppState;

pub fn chat_routes() -> Router {
    Router::new()
        .route("/api/chats", get(list_chats).post(create_chat))
        .route("/api/chats/queue", get(chat_queue))
        .route("/api/chats/:id", patch(update_chat))
        .route("/api/chats/:id/threads", get(chat_threads))
}

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub selected: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ThreadsResponse {
    pub chat_id: i64,
    pub threads: Vec<ConversationThread>,
    pub latest_request: Option<Request>,
}

/// GET /api/chats - every chat, most recently updated first
pub async fn list_chats(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Vec<Chat>>, ApiError> {
    let chats = ChatService::list(&state.db_pool).await?;
    Ok(Json(chats))
}

/// POST /api/chats
pub async fn create_chat(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<CreateChatRequest>, JsonRejection>,
) -> Result<Json<Chat>, ApiError> {
    let Json(payload) = payload?;
    let user_id = payload
        .user_id
        .ok_or_else(|| ApiError::Validation("User ID is required".to_string()))?;

    let chat = ChatService::create(&state.db_pool, user_id, payload.status.unwrap_or(ChatStatus::Pending)).await?;
    Ok(Json(chat))
}

/// PATCH /api/chats/:id
pub async fn update_chat(
    Extension(state): Extension<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateChatRequest>, JsonRejection>,
) -> Result<Json<Chat>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = payload?;

    match ChatService::update(&state.db_pool, id, &patch).await? {
        Some(chat) => {
            tracing::info!("Updated chat {} (status: {})", chat.id, chat.status);
            Ok(Json(chat))
        }
        None => Err(ApiError::NotFound("Chat not found".to_string())),
    }
}

/// GET /api/chats/queue?search=&status=&selected= - filtered sidebar list
pub async fn chat_queue(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<QueueQuery>, QueryRejection>,
) -> Result<Json<ChatQueueView>, ApiError> {
    let Query(query) = query?;

    let status = match query.status.as_deref() {
        None | Some("") => StatusFilter::default(),
        Some(raw) => raw.parse().map_err(ApiError::Validation)?,
    };
    let filter = ChatFilter::new(query.search.unwrap_or_default(), status);

    let chats = ChatService::list(&state.db_pool).await?;
    let filtered = filter_chats(&chats, &filter);
    let auto_select = auto_select_candidate(&filtered, &filter, query.selected);

    Ok(Json(ChatQueueView {
        chats: filtered,
        selected_chat_id: query.selected,
        auto_select,
    }))
}

/// GET /api/chats/:id/threads - request/response pairs for the chat window
pub async fn chat_threads(
    Extension(state): Extension<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ThreadsResponse>, ApiError> {
    let Path(chat_id) = id?;

    if ChatService::get(&state.db_pool, chat_id).await?.is_none() {
        return Err(ApiError::NotFound("Chat not found".to_string()));
    }

    let (requests, responses) = tokio::try_join!(
        RequestService::list_for_chat(&state.db_pool, chat_id),
        ResponseService::list_for_chat(&state.db_pool, chat_id),
    )?;

    let threads = build_threads(&requests, &responses);
    let latest = latest_request(&requests).cloned();

    Ok(Json(ThreadsResponse {
        chat_id,
        threads,
        latest_request: latest,
    }))
}
