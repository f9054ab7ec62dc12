// src/handlers/mod.rs
use serde::Deserialize;

use crate::error::ApiError;

pub mod app_status;
pub mod chats;
pub mod client_queries;
pub mod requests;
pub mod responses;
pub mod status;
pub mod templates;
pub mod uploads;

/// `?chatId=` as sent by the dashboard. Kept as a string so a missing or
/// malformed value gets our own 400 message.
#[derive(Debug, Default, Deserialize)]
pub struct ChatIdQuery {
    #[serde(rename = "chatId")]
    pub chat_id: Option<String>,
}

pub fn require_chat_id(raw: Option<&str>) -> Result<i64, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Validation("Chat ID is required".to_string()))?;
    raw.parse::<i64>()
        .map_err(|_| ApiError::Validation("Chat ID must be a number".to_string()))
}
