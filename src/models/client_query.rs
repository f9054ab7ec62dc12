use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Single-table query shape: the client's prompt and the operator's
/// image answers live on the same row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ClientQuery {
    pub id: i64,
    pub chat_id: i64,
    pub client_id: i64,
    pub image_url: Option<String>,
    pub query_text: Option<String>,
    pub chatgpt_response_url: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClientQueryRequest {
    pub chat_id: Option<i64>,
    pub client_id: Option<i64>,
    pub image_url: Option<String>,
    pub query_text: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClientQueryRequest {
    pub image_url: Option<String>,
    pub query_text: Option<String>,
    pub chatgpt_response_url: Option<Vec<String>>,
    pub status: Option<String>,
}
