// src/handlers/uploads.rs
use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::{PathRejection, QueryRejection},
        DefaultBodyLimit, Extension, Path, Query,
    },
    response::Json,
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::require_chat_id;
use crate::error::ApiError;
use crate::models::{ClientQuery, Response};
use crate::services::{ChatService, ClientQueryService, ResponseService};
use crate::storage::StorageError;
use crate::upload::{
    ClientQueryTarget, ImageSource, NewResponseTarget, StagedImage, UploadController, UploadError,
    UploadOutcome,
};
use crate::AppState;

pub fn upload_routes(max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/responses/upload", post(upload_response_images))
        .route("/api/client-queries/:id/images", post(upload_client_query_images))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(rename = "chatId")]
    pub chat_id: Option<String>,
    #[serde(rename = "requestId")]
    pub request_id: Option<String>,
}

/// One input event: a picker selection, a drop, or a single paste.
type StageEvent = (ImageSource, Vec<StagedImage>);

#[derive(Debug, Default)]
struct UploadForm {
    events: Vec<StageEvent>,
    message: Option<String>,
}

/// POST /api/responses/upload?chatId=&requestId= - operator reply with images
pub async fn upload_response_images(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadOutcome<Response>>, ApiError> {
    let Query(query) = query?;
    let chat_id = require_chat_id(query.chat_id.as_deref())?;
    let request_id = parse_request_id(query.request_id.as_deref())?;
    let multipart = multipart.map_err(|e| ApiError::Validation(e.body_text()))?;
    ensure_storage(&state)?;

    if ChatService::get(&state.db_pool, chat_id).await?.is_none() {
        return Err(ApiError::NotFound("Chat not found".to_string()));
    }
    // Refuse a bad link before anything reaches storage.
    let request_id = ResponseService::link_request(&state.db_pool, chat_id, request_id).await?;

    let form = read_form(multipart).await?;
    let mut controller = UploadController::new(state.upload_policy, Vec::new());
    stage_events(&mut controller, form.events)?;

    let target = NewResponseTarget {
        pool: &state.db_pool,
        chat_id,
        request_id,
        message: form.message,
    };
    let outcome = controller.submit(state.image_store.as_ref(), &target).await?;

    tracing::info!(
        "Response {} saved for chat {} with {}/{} images",
        outcome.record.id,
        chat_id,
        outcome.uploaded,
        outcome.attempted
    );
    Ok(Json(outcome))
}

/// POST /api/client-queries/:id/images - appends answer images to a query
pub async fn upload_client_query_images(
    Extension(state): Extension<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadOutcome<ClientQuery>>, ApiError> {
    let Path(id) = id?;
    let multipart = multipart.map_err(|e| ApiError::Validation(e.body_text()))?;
    ensure_storage(&state)?;

    let existing = ClientQueryService::get(&state.db_pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Client query not found".to_string()))?;

    let form = read_form(multipart).await?;
    let mut controller = UploadController::new(state.upload_policy, existing.chatgpt_response_url);
    stage_events(&mut controller, form.events)?;

    let target = ClientQueryTarget {
        pool: &state.db_pool,
        id,
    };
    let outcome = controller.submit(state.image_store.as_ref(), &target).await?;
    Ok(Json(outcome))
}

fn ensure_storage(state: &AppState) -> Result<(), ApiError> {
    if state.storage_configured {
        Ok(())
    } else {
        Err(StorageError::NotConfigured.into())
    }
}

fn parse_request_id(raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::Validation("Request ID must be a number".to_string())),
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to parse multipart field: {}", e);
        ApiError::Validation(format!("Invalid multipart body: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "message" {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(format!("Invalid message field: {}", e)))?;
            form.message = Some(text).filter(|text| !text.trim().is_empty());
            continue;
        }

        let Some(source) = ImageSource::from_field_name(&name) else {
            tracing::debug!("Ignoring multipart field '{}'", name);
            continue;
        };

        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| guess_image_type(&file_name).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read file '{}': {}", file_name, e);
            ApiError::Validation(format!("Failed to read file '{}'", file_name))
        })?;

        tracing::debug!("Received '{}' ({}, {} bytes) via {:?}", file_name, content_type, bytes.len(), source);
        push_part(&mut form.events, source, StagedImage::new(file_name, content_type, bytes));
    }

    Ok(form)
}

/// Consecutive picker or drop parts form one batch. Every pasted part is
/// its own event.
fn push_part(events: &mut Vec<StageEvent>, source: ImageSource, image: StagedImage) {
    match events.last_mut() {
        Some((last, files)) if *last == source && source != ImageSource::Paste => files.push(image),
        _ => events.push((source, vec![image])),
    }
}

fn stage_events(controller: &mut UploadController, events: Vec<StageEvent>) -> Result<(), UploadError> {
    for (source, files) in events {
        controller.stage(source, files)?;
    }
    Ok(())
}

fn guess_image_type(file_name: &str) -> Option<&'static str> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mime_type = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tiff" => "image/tiff",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::UploadPolicy;

    fn png(name: &str) -> StagedImage {
        StagedImage::new(name, "image/png", vec![1u8, 2, 3])
    }

    #[test]
    fn test_consecutive_picker_parts_form_one_batch() {
        let mut events = Vec::new();
        push_part(&mut events, ImageSource::Picker, png("a.png"));
        push_part(&mut events, ImageSource::Picker, png("b.png"));
        push_part(&mut events, ImageSource::Drop, png("c.png"));
        push_part(&mut events, ImageSource::Picker, png("d.png"));

        let shape: Vec<(ImageSource, usize)> = events.iter().map(|(s, f)| (*s, f.len())).collect();
        assert_eq!(
            shape,
            vec![(ImageSource::Picker, 2), (ImageSource::Drop, 1), (ImageSource::Picker, 1)]
        );
    }

    #[test]
    fn test_each_paste_is_separate() {
        let mut events = Vec::new();
        push_part(&mut events, ImageSource::Paste, png("a.png"));
        push_part(&mut events, ImageSource::Paste, png("b.png"));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_oversized_picker_batch_is_rejected_whole() {
        let mut events = Vec::new();
        for name in ["a.png", "b.png", "c.png", "d.png"] {
            push_part(&mut events, ImageSource::Picker, png(name));
        }
        let mut controller = UploadController::new(UploadPolicy::default(), Vec::new());

        let err = stage_events(&mut controller, events).unwrap_err();
        assert_eq!(err.to_string(), "Maximum of 3 images allowed.");
        assert!(controller.staged().is_empty());
    }

    #[test]
    fn test_guess_image_type() {
        assert_eq!(guess_image_type("photo.JPG"), Some("image/jpeg"));
        assert_eq!(guess_image_type("shot.webp"), Some("image/webp"));
        assert_eq!(guess_image_type("notes.pdf"), None);
        assert_eq!(guess_image_type("no_extension"), None);
    }

    #[test]
    fn test_parse_request_id() {
        assert_eq!(parse_request_id(None).unwrap(), None);
        assert_eq!(parse_request_id(Some("")).unwrap(), None);
        assert_eq!(parse_request_id(Some("12")).unwrap(), Some(12));
        assert!(parse_request_id(Some("x")).is_err());
    }
}
