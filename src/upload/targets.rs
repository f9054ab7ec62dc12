// src/upload/targets.rs
use async_trait::async_trait;
use sqlx::PgPool;

use super::controller::ImageTarget;
use crate::error::ApiError;
use crate::models::{ClientQuery, NewResponse, Response};
use crate::services::{ClientQueryService, ResponseService};

/// Inserts a fresh response row carrying the uploaded images.
pub struct NewResponseTarget<'a> {
    pub pool: &'a PgPool,
    pub chat_id: i64,
    pub request_id: Option<i64>,
    pub message: Option<String>,
}

#[async_trait]
impl ImageTarget for NewResponseTarget<'_> {
    type Record = Response;

    async fn save(&self, urls: &[String]) -> Result<Response, ApiError> {
        let new = NewResponse {
            chat_id: self.chat_id,
            request_id: self.request_id,
            message: self.message.clone(),
            image_url: urls.to_vec(),
        };
        Ok(ResponseService::create(self.pool, new).await?)
    }
}

/// Overwrites the answer images of an existing client query.
pub struct ClientQueryTarget<'a> {
    pub pool: &'a PgPool,
    pub id: i64,
}

#[async_trait]
impl ImageTarget for ClientQueryTarget<'_> {
    type Record = ClientQuery;

    async fn save(&self, urls: &[String]) -> Result<ClientQuery, ApiError> {
        ClientQueryService::set_response_urls(self.pool, self.id, urls)
            .await?
            .ok_or_else(|| ApiError::NotFound("Client query not found".to_string()))
    }
}
