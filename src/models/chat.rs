// src/models/chat.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a chat, stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Pending,
    // Older rows were written as "processing"
    #[serde(alias = "processing")]
    InProgress,
    Completed,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown chat status: {0}")]
pub struct UnknownChatStatus(pub String);

impl ChatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Pending => "pending",
            ChatStatus::InProgress => "in_progress",
            ChatStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatStatus {
    type Err = UnknownChatStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ChatStatus::Pending),
            "in_progress" | "processing" => Ok(ChatStatus::InProgress),
            "completed" => Ok(ChatStatus::Completed),
            other => Err(UnknownChatStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for ChatStatus {
    type Error = UnknownChatStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Chat {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "String")]
    pub status: ChatStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An inbound client prompt. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Request {
    pub id: i64,
    pub chat_id: i64,
    pub prompt: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An operator reply. `request_id` is NULL for rows written before the
/// explicit link existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Response {
    pub id: i64,
    pub chat_id: i64,
    pub request_id: Option<i64>,
    pub message: Option<String>,
    pub image_url: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub user_id: Option<i64>,
    pub status: Option<ChatStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateChatRequest {
    pub user_id: Option<i64>,
    pub status: Option<ChatStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestPayload {
    pub chat_id: Option<i64>,
    pub prompt: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateResponsePayload {
    pub chat_id: Option<i64>,
    pub request_id: Option<i64>,
    pub message: Option<String>,
    pub image_url: Option<Vec<String>>,
}

/// Validated input for inserting a response row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResponse {
    pub chat_id: i64,
    pub request_id: Option<i64>,
    pub message: Option<String>,
    pub image_url: Vec<String>,
}
