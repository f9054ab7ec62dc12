// src/storage.rs
//! Object storage for response images (Supabase-style storage REST API).

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::upload::StagedImage;

/// Folder inside the bucket that operator images are written to.
pub const RESPONSE_IMAGE_PREFIX: &str = "image_response";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload of '{path}' rejected with status {status}: {body}")]
    Rejected {
        path: String,
        status: u16,
        body: String,
    },
    #[error("object storage is not configured")]
    NotConfigured,
}

/// Turns image bytes into a publicly resolvable URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: &StagedImage) -> Result<String, StorageError>;
}

#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            bucket: config.bucket.clone(),
        }
    }

    /// Unique object path so concurrent uploads of the same file name never collide.
    pub fn object_path(file_name: &str) -> String {
        let name = if file_name.is_empty() { "image" } else { file_name };
        format!("{}/{}-{}", RESPONSE_IMAGE_PREFIX, Uuid::new_v4(), urlencoding::encode(name))
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, path)
    }

    fn upload_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }
}

#[async_trait]
impl ImageStore for StorageClient {
    async fn upload(&self, image: &StagedImage) -> Result<String, StorageError> {
        let path = Self::object_path(&image.file_name);

        let response = self
            .client
            .post(self.upload_url(&path))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("content-type", &image.content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(image.bytes.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Storage upload failed for {}: {} - {}", path, status, body);
            return Err(StorageError::Rejected { path, status, body });
        }

        info!("Stored image '{}' at {} ({} bytes)", image.file_name, path, image.bytes.len());
        Ok(self.public_url(&path))
    }
}

/// Stand-in used when STORAGE_URL/STORAGE_KEY are absent; every upload fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

#[async_trait]
impl ImageStore for DisabledStore {
    async fn upload(&self, _image: &StagedImage) -> Result<String, StorageError> {
        Err(StorageError::NotConfigured)
    }
}
