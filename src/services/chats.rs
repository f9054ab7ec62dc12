// Chat rows: listing, creation and status bookkeeping

use sqlx::PgPool;

use crate::models::chat::UpdateChatRequest;
use crate::models::{Chat, ChatStatus};

pub struct ChatService;

impl ChatService {
    /// All chats, most recently touched first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Chat>, sqlx::Error> {
        sqlx::query_as::<_, Chat>(
            "SELECT id, user_id, status, created_at, updated_at FROM chats ORDER BY updated_at DESC"
        )
        .fetch_all(pool)
        .await
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Chat>, sqlx::Error> {
        sqlx::query_as::<_, Chat>(
            "SELECT id, user_id, status, created_at, updated_at FROM chats WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, user_id: i64, status: ChatStatus) -> Result<Chat, sqlx::Error> {
        let chat = sqlx::query_as::<_, Chat>(
            r#"
            INSERT INTO chats (user_id, status, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING id, user_id, status, created_at, updated_at
            "#
        )
        .bind(user_id)
        .bind(status.as_str())
        .fetch_one(pool)
        .await?;

        tracing::info!("Created chat {} for user {}", chat.id, chat.user_id);
        Ok(chat)
    }

    /// Applies the provided fields and bumps `updated_at`. `None` if the chat doesn't exist.
    pub async fn update(pool: &PgPool, id: i64, patch: &UpdateChatRequest) -> Result<Option<Chat>, sqlx::Error> {
        sqlx::query_as::<_, Chat>(
            r#"
            UPDATE chats
            SET user_id = COALESCE($2, user_id),
                status = COALESCE($3, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, status, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(patch.user_id)
        .bind(patch.status.map(|s| s.as_str()))
        .fetch_optional(pool)
        .await
    }

    /// Records activity on a chat after a request or response lands.
    pub async fn touch(pool: &PgPool, id: i64, status: ChatStatus) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE chats SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Follow-up write after an insert. The two statements are not atomic,
    /// so a failure here leaves the chat stale and is only logged.
    pub async fn touch_after_insert(pool: &PgPool, id: i64, status: ChatStatus) {
        if let Err(e) = Self::touch(pool, id, status).await {
            tracing::warn!("Failed to mark chat {} as {}: {}", id, status, e);
        }
    }
}
