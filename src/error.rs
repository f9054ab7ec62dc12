// src/error.rs
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::ResponseError;
use crate::storage::StorageError;
use crate::upload::UploadError;

/// Errors surfaced by the HTTP layer. Every variant renders as
/// `{"error": "..."}` with a matching status code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Storage(_) | ApiError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = %status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<ResponseError> for ApiError {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::RequestNotFound(_) => ApiError::NotFound(err.to_string()),
            ResponseError::RequestInOtherChat { .. } => ApiError::Validation(err.to_string()),
            ResponseError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Write(inner) => inner,
            UploadError::NothingUploaded { .. } => ApiError::Upstream(err.to_string()),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_error_taxonomy() {
        assert_eq!(ApiError::Validation("Chat ID is required".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("No app status found".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("stale".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Database(sqlx::Error::RowNotFound).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upload_errors_map_to_api_errors() {
        let capacity: ApiError = UploadError::CapacityExceeded { max: 3 }.into();
        assert_eq!(capacity.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(capacity.to_string(), "Maximum of 3 images allowed.");

        let nothing: ApiError = UploadError::NothingUploaded { attempted: 2 }.into();
        assert_eq!(nothing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let write: ApiError = UploadError::Write(ApiError::NotFound("Client query not found".into())).into();
        assert_eq!(write.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_response_link_errors_map_to_client_errors() {
        let missing: ApiError = ResponseError::RequestNotFound(99).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "Request not found");

        let foreign: ApiError = ResponseError::RequestInOtherChat { request_id: 99, chat_id: 7 }.into();
        assert_eq!(foreign.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(foreign.to_string(), "Request 99 does not belong to chat 7");
    }

    #[tokio::test]
    async fn test_error_body_is_json_object_with_error_field() {
        let response = ApiError::Validation("Chat ID is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "Chat ID is required" }));
    }
}
