// Inbound client requests

use sqlx::PgPool;

use super::ChatService;
use crate::models::{ChatStatus, Request};

pub struct RequestService;

impl RequestService {
    /// Requests of a chat, oldest first.
    pub async fn list_for_chat(pool: &PgPool, chat_id: i64) -> Result<Vec<Request>, sqlx::Error> {
        sqlx::query_as::<_, Request>(
            "SELECT id, chat_id, prompt, image_url, created_at FROM requests WHERE chat_id = $1 ORDER BY created_at ASC"
        )
        .bind(chat_id)
        .fetch_all(pool)
        .await
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Request>, sqlx::Error> {
        sqlx::query_as::<_, Request>(
            "SELECT id, chat_id, prompt, image_url, created_at FROM requests WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn latest_for_chat(pool: &PgPool, chat_id: i64) -> Result<Option<Request>, sqlx::Error> {
        sqlx::query_as::<_, Request>(
            "SELECT id, chat_id, prompt, image_url, created_at FROM requests WHERE chat_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1"
        )
        .bind(chat_id)
        .fetch_optional(pool)
        .await
    }

    /// Inserts the request, then moves the chat to `in_progress`.
    pub async fn create(
        pool: &PgPool,
        chat_id: i64,
        prompt: &str,
        image_url: Option<&str>,
    ) -> Result<Request, sqlx::Error> {
        let request = sqlx::query_as::<_, Request>(
            r#"
            INSERT INTO requests (chat_id, prompt, image_url, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, chat_id, prompt, image_url, created_at
            "#
        )
        .bind(chat_id)
        .bind(prompt)
        .bind(image_url)
        .fetch_one(pool)
        .await?;

        tracing::info!("Created request {} in chat {}", request.id, chat_id);
        ChatService::touch_after_insert(pool, chat_id, ChatStatus::InProgress).await;

        Ok(request)
    }
}
