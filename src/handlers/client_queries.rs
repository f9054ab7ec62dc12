// src/handlers/client_queries.rs
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    response::Json,
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::grouping::{group_client_chats, ClientChatsGroup};
use crate::models::client_query::{CreateClientQueryRequest, UpdateClientQueryRequest};
use crate::models::ClientQuery;
use crate::services::ClientQueryService;
use crate::AppState;

pub fn client_query_routes() -> Router {
    Router::new()
        .route("/api/client-queries", get(list_client_queries).post(create_client_query))
        .route("/api/client-queries/:id", patch(update_client_query))
        .route("/api/client-chats", get(list_client_chats))
}

/// GET /api/client-queries - newest first
pub async fn list_client_queries(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<ClientQuery>>, ApiError> {
    Ok(Json(ClientQueryService::list(&state.db_pool).await?))
}

/// POST /api/client-queries
pub async fn create_client_query(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<CreateClientQueryRequest>, JsonRejection>,
) -> Result<Json<ClientQuery>, ApiError> {
    let Json(payload) = payload?;
    let chat_id = payload
        .chat_id
        .ok_or_else(|| ApiError::Validation("Chat ID is required".to_string()))?;
    let client_id = payload
        .client_id
        .ok_or_else(|| ApiError::Validation("Client ID is required".to_string()))?;

    let query = ClientQueryService::create(&state.db_pool, chat_id, client_id, &payload).await?;
    tracing::info!("Created client query {} (chat {}, client {})", query.id, chat_id, client_id);
    Ok(Json(query))
}

/// PATCH /api/client-queries/:id
pub async fn update_client_query(
    Extension(state): Extension<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateClientQueryRequest>, JsonRejection>,
) -> Result<Json<ClientQuery>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = payload?;

    if let Some(urls) = &patch.chatgpt_response_url {
        let max = state.upload_policy.max_images;
        if urls.len() > max {
            return Err(ApiError::Validation(format!("Maximum of {} images allowed.", max)));
        }
    }

    ClientQueryService::update(&state.db_pool, id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Client query not found".to_string()))
}

/// GET /api/client-chats - sidebar hierarchy of clients and their chats
pub async fn list_client_chats(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<ClientChatsGroup>>, ApiError> {
    let pairs = ClientQueryService::chat_pairs(&state.db_pool).await?;
    Ok(Json(group_client_chats(pairs)))
}
