// Single-table client queries

use sqlx::PgPool;

use crate::grouping::ClientChat;
use crate::models::client_query::{CreateClientQueryRequest, UpdateClientQueryRequest};
use crate::models::ClientQuery;

pub struct ClientQueryService;

impl ClientQueryService {
    /// Newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<ClientQuery>, sqlx::Error> {
        sqlx::query_as::<_, ClientQuery>(
            "SELECT id, chat_id, client_id, image_url, query_text, chatgpt_response_url, status, created_at FROM client_queries ORDER BY created_at DESC"
        )
        .fetch_all(pool)
        .await
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<ClientQuery>, sqlx::Error> {
        sqlx::query_as::<_, ClientQuery>(
            "SELECT id, chat_id, client_id, image_url, query_text, chatgpt_response_url, status, created_at FROM client_queries WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        chat_id: i64,
        client_id: i64,
        payload: &CreateClientQueryRequest,
    ) -> Result<ClientQuery, sqlx::Error> {
        sqlx::query_as::<_, ClientQuery>(
            r#"
            INSERT INTO client_queries (chat_id, client_id, image_url, query_text, status, created_at)
            VALUES ($1, $2, $3, $4, COALESCE($5, 'pending'), NOW())
            RETURNING id, chat_id, client_id, image_url, query_text, chatgpt_response_url, status, created_at
            "#
        )
        .bind(chat_id)
        .bind(client_id)
        .bind(&payload.image_url)
        .bind(&payload.query_text)
        .bind(&payload.status)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        patch: &UpdateClientQueryRequest,
    ) -> Result<Option<ClientQuery>, sqlx::Error> {
        sqlx::query_as::<_, ClientQuery>(
            r#"
            UPDATE client_queries
            SET image_url = COALESCE($2, image_url),
                query_text = COALESCE($3, query_text),
                chatgpt_response_url = COALESCE($4, chatgpt_response_url),
                status = COALESCE($5, status)
            WHERE id = $1
            RETURNING id, chat_id, client_id, image_url, query_text, chatgpt_response_url, status, created_at
            "#
        )
        .bind(id)
        .bind(&patch.image_url)
        .bind(&patch.query_text)
        .bind(&patch.chatgpt_response_url)
        .bind(&patch.status)
        .fetch_optional(pool)
        .await
    }

    /// Replaces the answer images and marks the query completed.
    pub async fn set_response_urls(
        pool: &PgPool,
        id: i64,
        urls: &[String],
    ) -> Result<Option<ClientQuery>, sqlx::Error> {
        let patch = UpdateClientQueryRequest {
            chatgpt_response_url: Some(urls.to_vec()),
            status: Some("completed".to_string()),
            ..Default::default()
        };
        Self::update(pool, id, &patch).await
    }

    /// Raw (chat, client) pairs, duplicates included.
    pub async fn chat_pairs(pool: &PgPool) -> Result<Vec<ClientChat>, sqlx::Error> {
        sqlx::query_as::<_, ClientChat>(
            "SELECT chat_id, client_id FROM client_queries ORDER BY created_at DESC"
        )
        .fetch_all(pool)
        .await
    }
}
