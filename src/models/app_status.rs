use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Process-wide availability flag shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AppStatus {
    pub id: i64,
    pub is_available: bool,
    pub status_message: Option<String>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// PATCH body. `version` must match the stored row for the write to land.
#[derive(Debug, Deserialize)]
pub struct UpdateAppStatusRequest {
    pub id: Option<i64>,
    pub version: Option<i64>,
    pub is_available: Option<bool>,
    pub status_message: Option<String>,
}
