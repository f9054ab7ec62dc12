// src/upload/mod.rs
//! Image batch uploads for operator replies: staging with a hard cap,
//! concurrent best-effort uploads, then a single record write.

use axum::body::Bytes;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ApiError;

pub mod controller;
pub mod targets;

pub use controller::{ImageTarget, ImageView, UploadController, UploadOutcome, UploadPhase};
pub use targets::{ClientQueryTarget, NewResponseTarget};

/// Where a file entered the composer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Picker,
    Drop,
    Paste,
}

impl ImageSource {
    /// Maps a multipart field name onto its source.
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "files" | "images" => Some(ImageSource::Picker),
            "dropped" => Some(ImageSource::Drop),
            "pasted" => Some(ImageSource::Paste),
            _ => None,
        }
    }
}

/// In-memory file handle shared by every source.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl StagedImage {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// What to do with an incoming batch that would push the staged set past the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Refuse the whole batch and leave the staged set untouched.
    #[default]
    Reject,
    /// Keep as many as still fit, in arrival order.
    Truncate,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(OverflowPolicy::Reject),
            "truncate" => Ok(OverflowPolicy::Truncate),
            other => Err(format!("expected 'reject' or 'truncate', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_images: usize,
    pub overflow: OverflowPolicy,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_images: crate::config::DEFAULT_MAX_IMAGES,
            overflow: OverflowPolicy::Reject,
        }
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Maximum of {max} images allowed.")]
    CapacityExceeded { max: usize },
    #[error("No image found in clipboard. Try copying an image first.")]
    NoImageInClipboard,
    #[error("The dropped files are not images.")]
    DroppedNotImages,
    #[error("The selected files are not images.")]
    SelectedNotImages,
    #[error("No staged image at position {0}.")]
    NoSuchImage(usize),
    #[error("No images staged for upload.")]
    NothingStaged,
    #[error("None of the {attempted} images uploaded; nothing was saved.")]
    NothingUploaded { attempted: usize },
    #[error(transparent)]
    Write(ApiError),
}
