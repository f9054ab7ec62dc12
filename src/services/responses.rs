// Operator responses

use sqlx::PgPool;
use thiserror::Error;

use super::{ChatService, RequestService};
use crate::models::{ChatStatus, NewResponse, Request, Response};

pub struct ResponseService;

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("Request not found")]
    RequestNotFound(i64),
    #[error("Request {request_id} does not belong to chat {chat_id}")]
    RequestInOtherChat { request_id: i64, chat_id: i64 },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Picks the request a new response answers.
///
/// With an explicit id, `candidate` is that request as loaded (if it
/// exists) and must belong to `chat_id`. Without one, `candidate` is the
/// chat's latest request and the response links to it when present.
pub fn resolve_request_id(
    chat_id: i64,
    explicit: Option<i64>,
    candidate: Option<&Request>,
) -> Result<Option<i64>, ResponseError> {
    match explicit {
        Some(request_id) => {
            let request = candidate.ok_or(ResponseError::RequestNotFound(request_id))?;
            if request.chat_id != chat_id {
                return Err(ResponseError::RequestInOtherChat { request_id, chat_id });
            }
            Ok(Some(request_id))
        }
        None => Ok(candidate
            .filter(|request| request.chat_id == chat_id)
            .map(|request| request.id)),
    }
}

impl ResponseService {
    /// Responses of a chat, oldest first.
    pub async fn list_for_chat(pool: &PgPool, chat_id: i64) -> Result<Vec<Response>, sqlx::Error> {
        sqlx::query_as::<_, Response>(
            "SELECT id, chat_id, request_id, message, image_url, created_at FROM responses WHERE chat_id = $1 ORDER BY created_at ASC"
        )
        .bind(chat_id)
        .fetch_all(pool)
        .await
    }

    /// Loads whatever `resolve_request_id` needs and applies it.
    pub async fn link_request(
        pool: &PgPool,
        chat_id: i64,
        explicit: Option<i64>,
    ) -> Result<Option<i64>, ResponseError> {
        let candidate = match explicit {
            Some(id) => RequestService::get(pool, id).await?,
            None => RequestService::latest_for_chat(pool, chat_id).await?,
        };
        resolve_request_id(chat_id, explicit, candidate.as_ref())
    }

    /// Inserts a response and marks the chat completed.
    ///
    /// Without an explicit `request_id` the response answers the chat's
    /// latest request, if it has one.
    pub async fn create(pool: &PgPool, new: NewResponse) -> Result<Response, ResponseError> {
        let request_id = Self::link_request(pool, new.chat_id, new.request_id).await?;

        let response = sqlx::query_as::<_, Response>(
            r#"
            INSERT INTO responses (chat_id, request_id, message, image_url, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, chat_id, request_id, message, image_url, created_at
            "#
        )
        .bind(new.chat_id)
        .bind(request_id)
        .bind(&new.message)
        .bind(&new.image_url)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            "Created response {} in chat {} (request {:?}, {} images)",
            response.id,
            response.chat_id,
            response.request_id,
            response.image_url.len()
        );
        ChatService::touch_after_insert(pool, new.chat_id, ChatStatus::Completed).await;

        Ok(response)
    }
}
