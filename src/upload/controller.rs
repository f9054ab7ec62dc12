// src/upload/controller.rs
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;

use super::{ImageSource, OverflowPolicy, StagedImage, UploadError, UploadPolicy};
use crate::error::ApiError;
use crate::storage::ImageStore;

/// Record that receives the combined URL list in one write.
#[async_trait]
pub trait ImageTarget: Send + Sync {
    type Record: Send;

    async fn save(&self, urls: &[String]) -> Result<Self::Record, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    Staging,
    Uploading,
}

/// URLs shown for the record. `PendingLocal` is set before the durable
/// write is acknowledged and carries what to roll back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageView {
    Confirmed(Vec<String>),
    PendingLocal { urls: Vec<String>, previous: Vec<String> },
}

impl ImageView {
    pub fn urls(&self) -> &[String] {
        match self {
            ImageView::Confirmed(urls) => urls,
            ImageView::PendingLocal { urls, .. } => urls,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome<R> {
    pub attempted: usize,
    pub uploaded: usize,
    pub urls: Vec<String>,
    pub record: R,
}

/// Per-message composition state.
#[derive(Debug)]
pub struct UploadController {
    policy: UploadPolicy,
    staged: Vec<StagedImage>,
    phase: UploadPhase,
    view: ImageView,
}

impl UploadController {
    pub fn new(policy: UploadPolicy, confirmed_urls: Vec<String>) -> Self {
        Self {
            policy,
            staged: Vec::new(),
            phase: UploadPhase::Idle,
            view: ImageView::Confirmed(confirmed_urls),
        }
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    pub fn staged(&self) -> &[StagedImage] {
        &self.staged
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn view(&self) -> &ImageView {
        &self.view
    }

    /// Room left on the record: confirmed URLs and staged files both count.
    fn remaining(&self) -> usize {
        self.policy
            .max_images
            .saturating_sub(self.view.urls().len() + self.staged.len())
    }

    /// Stages files from one input event. On error the staged set is unchanged.
    pub fn stage(&mut self, source: ImageSource, files: Vec<StagedImage>) -> Result<usize, UploadError> {
        let accepted = match source {
            ImageSource::Paste => self.accept_paste(files)?,
            ImageSource::Drop => self.accept_batch(files, UploadError::DroppedNotImages)?,
            ImageSource::Picker => self.accept_batch(files, UploadError::SelectedNotImages)?,
        };

        let count = accepted.len();
        self.staged.extend(accepted);
        if !self.staged.is_empty() {
            self.phase = UploadPhase::Staging;
        }
        tracing::debug!(?source, count, staged = self.staged.len(), "staged images");
        Ok(count)
    }

    // Clipboard: only the first image item is taken.
    fn accept_paste(&self, items: Vec<StagedImage>) -> Result<Vec<StagedImage>, UploadError> {
        let image = items
            .into_iter()
            .find(StagedImage::is_image)
            .ok_or(UploadError::NoImageInClipboard)?;

        if self.remaining() == 0 {
            return Err(UploadError::CapacityExceeded { max: self.policy.max_images });
        }
        Ok(vec![image])
    }

    fn accept_batch(&self, files: Vec<StagedImage>, not_images: UploadError) -> Result<Vec<StagedImage>, UploadError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let remaining = self.remaining();
        let exceeded = UploadError::CapacityExceeded { max: self.policy.max_images };

        match self.policy.overflow {
            OverflowPolicy::Reject => {
                // The cap is checked against everything offered, images or not.
                if files.len() > remaining {
                    return Err(exceeded);
                }
                let images: Vec<_> = files.into_iter().filter(StagedImage::is_image).collect();
                if images.is_empty() {
                    return Err(not_images);
                }
                Ok(images)
            }
            OverflowPolicy::Truncate => {
                let mut images: Vec<_> = files.into_iter().filter(StagedImage::is_image).collect();
                if images.is_empty() {
                    return Err(not_images);
                }
                if remaining == 0 {
                    return Err(exceeded);
                }
                images.truncate(remaining);
                Ok(images)
            }
        }
    }

    pub fn remove(&mut self, index: usize) -> Result<StagedImage, UploadError> {
        if index >= self.staged.len() {
            return Err(UploadError::NoSuchImage(index));
        }
        let removed = self.staged.remove(index);
        if self.staged.is_empty() {
            self.phase = UploadPhase::Idle;
        }
        Ok(removed)
    }

    /// Uploads every staged file concurrently and writes the surviving URLs
    /// (appended to the confirmed ones, capped) to `target` in one call.
    ///
    /// Individual upload failures are logged and skipped. If nothing
    /// uploads, or the write fails, the staged files are kept for retry.
    pub async fn submit<T>(
        &mut self,
        store: &dyn ImageStore,
        target: &T,
    ) -> Result<UploadOutcome<T::Record>, UploadError>
    where
        T: ImageTarget + ?Sized,
    {
        if self.staged.is_empty() {
            return Err(UploadError::NothingStaged);
        }

        self.phase = UploadPhase::Uploading;
        let attempted = self.staged.len();

        let results = join_all(self.staged.iter().map(|image| store.upload(image))).await;

        let mut new_urls = Vec::with_capacity(attempted);
        for (image, result) in self.staged.iter().zip(results) {
            match result {
                Ok(url) => new_urls.push(url),
                Err(e) => tracing::warn!("Upload of '{}' failed: {}", image.file_name, e),
            }
        }

        if new_urls.is_empty() {
            tracing::warn!("No uploads succeeded out of {}; nothing saved", attempted);
            self.phase = UploadPhase::Staging;
            return Err(UploadError::NothingUploaded { attempted });
        }

        let previous = self.view.urls().to_vec();
        let mut combined = previous.clone();
        combined.extend(new_urls.iter().cloned());
        combined.truncate(self.policy.max_images);

        self.view = ImageView::PendingLocal {
            urls: combined.clone(),
            previous: previous.clone(),
        };

        match target.save(&combined).await {
            Ok(record) => {
                tracing::info!("Saved {} image URLs ({} of {} uploads succeeded)", combined.len(), new_urls.len(), attempted);
                self.view = ImageView::Confirmed(combined.clone());
                self.staged.clear();
                self.phase = UploadPhase::Idle;
                Ok(UploadOutcome {
                    attempted,
                    uploaded: new_urls.len(),
                    urls: combined,
                    record,
                })
            }
            Err(e) => {
                tracing::error!("Saving uploaded image URLs failed, rolling back: {}", e);
                self.view = ImageView::Confirmed(previous);
                self.phase = UploadPhase::Staging;
                Err(UploadError::Write(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use std::sync::Mutex;

    /// Fails any file whose name starts with "bad".
    struct FakeStore;

    #[async_trait]
    impl ImageStore for FakeStore {
        async fn upload(&self, image: &StagedImage) -> Result<String, StorageError> {
            if image.file_name.starts_with("bad") {
                return Err(StorageError::Rejected {
                    path: image.file_name.clone(),
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(format!("https://cdn.test/{}", image.file_name))
        }
    }

    #[derive(Default)]
    struct RecordingTarget {
        writes: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageTarget for RecordingTarget {
        type Record = usize;

        async fn save(&self, urls: &[String]) -> Result<usize, ApiError> {
            if self.fail {
                return Err(ApiError::Upstream("write failed".to_string()));
            }
            let mut writes = self.writes.lock().unwrap();
            writes.push(urls.to_vec());
            Ok(writes.len())
        }
    }

    fn png(name: &str) -> StagedImage {
        StagedImage::new(name, "image/png", vec![1u8, 2, 3])
    }

    fn pdf(name: &str) -> StagedImage {
        StagedImage::new(name, "application/pdf", vec![9u8])
    }

    fn controller(max_images: usize, overflow: OverflowPolicy) -> UploadController {
        UploadController::new(UploadPolicy { max_images, overflow }, Vec::new())
    }

    #[test]
    fn test_adding_past_the_cap_is_rejected_and_staged_set_kept() {
        let mut c = controller(3, OverflowPolicy::Reject);
        assert_eq!(c.stage(ImageSource::Picker, vec![png("a"), png("b"), png("c")]).unwrap(), 3);

        let err = c.stage(ImageSource::Picker, vec![png("d")]).unwrap_err();
        assert!(matches!(err, UploadError::CapacityExceeded { max: 3 }));
        assert_eq!(c.staged().len(), 3);
        assert_eq!(c.phase(), UploadPhase::Staging);
    }

    #[test]
    fn test_reject_policy_refuses_whole_overflowing_batch() {
        let mut c = controller(3, OverflowPolicy::Reject);
        c.stage(ImageSource::Drop, vec![png("a"), png("b")]).unwrap();

        assert!(c.stage(ImageSource::Drop, vec![png("c"), png("d")]).is_err());
        assert_eq!(c.staged().len(), 2);
    }

    #[test]
    fn test_truncate_policy_keeps_what_fits() {
        let mut c = controller(3, OverflowPolicy::Truncate);
        c.stage(ImageSource::Picker, vec![png("a"), png("b")]).unwrap();

        assert_eq!(c.stage(ImageSource::Drop, vec![png("c"), png("d")]).unwrap(), 1);
        let names: Vec<_> = c.staged().iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        assert!(matches!(
            c.stage(ImageSource::Picker, vec![png("e")]),
            Err(UploadError::CapacityExceeded { max: 3 })
        ));
    }

    #[test]
    fn test_drop_filters_non_images() {
        let mut c = controller(3, OverflowPolicy::Reject);
        assert_eq!(c.stage(ImageSource::Drop, vec![png("a"), pdf("b")]).unwrap(), 1);

        let err = c.stage(ImageSource::Drop, vec![pdf("c")]).unwrap_err();
        assert_eq!(err.to_string(), "The dropped files are not images.");
        assert_eq!(c.staged().len(), 1);
    }

    #[test]
    fn test_paste_takes_first_image_only() {
        let mut c = controller(3, OverflowPolicy::Reject);
        assert_eq!(c.stage(ImageSource::Paste, vec![pdf("text"), png("shot1"), png("shot2")]).unwrap(), 1);
        assert_eq!(c.staged()[0].file_name, "shot1");

        let err = c.stage(ImageSource::Paste, vec![pdf("text")]).unwrap_err();
        assert_eq!(err.to_string(), "No image found in clipboard. Try copying an image first.");
    }

    #[test]
    fn test_paste_at_capacity_is_rejected() {
        let mut c = controller(1, OverflowPolicy::Reject);
        c.stage(ImageSource::Paste, vec![png("a")]).unwrap();
        let err = c.stage(ImageSource::Paste, vec![png("b")]).unwrap_err();
        assert_eq!(err.to_string(), "Maximum of 1 images allowed.");
    }

    #[test]
    fn test_remove_returns_to_idle_when_empty() {
        let mut c = controller(3, OverflowPolicy::Reject);
        c.stage(ImageSource::Picker, vec![png("a")]).unwrap();
        assert!(matches!(c.remove(4), Err(UploadError::NoSuchImage(4))));
        assert_eq!(c.remove(0).unwrap().file_name, "a");
        assert_eq!(c.phase(), UploadPhase::Idle);
    }

    #[tokio::test]
    async fn test_partial_failure_writes_only_successful_urls() {
        let mut c = controller(3, OverflowPolicy::Reject);
        c.stage(ImageSource::Picker, vec![png("bad1"), png("good"), png("bad2")]).unwrap();
        let target = RecordingTarget::default();

        let outcome = c.submit(&FakeStore, &target).await.unwrap();

        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.uploaded, 1);
        assert_eq!(outcome.urls, vec!["https://cdn.test/good".to_string()]);
        assert_eq!(*target.writes.lock().unwrap(), vec![vec!["https://cdn.test/good".to_string()]]);
        assert!(c.staged().is_empty());
        assert_eq!(c.phase(), UploadPhase::Idle);
        assert_eq!(c.view(), &ImageView::Confirmed(outcome.urls.clone()));
    }

    #[tokio::test]
    async fn test_no_successful_upload_means_no_write() {
        let mut c = controller(3, OverflowPolicy::Reject);
        c.stage(ImageSource::Picker, vec![png("bad1"), png("bad2")]).unwrap();
        let target = RecordingTarget::default();

        let err = c.submit(&FakeStore, &target).await.unwrap_err();

        assert!(matches!(err, UploadError::NothingUploaded { attempted: 2 }));
        assert!(target.writes.lock().unwrap().is_empty());
        assert_eq!(c.staged().len(), 2);
        assert_eq!(c.phase(), UploadPhase::Staging);
    }

    #[tokio::test]
    async fn test_confirmed_urls_count_against_the_cap() {
        let policy = UploadPolicy { max_images: 3, overflow: OverflowPolicy::Reject };
        let mut c = UploadController::new(policy, vec!["https://cdn.test/old1".into(), "https://cdn.test/old2".into()]);
        c.stage(ImageSource::Picker, vec![png("n1")]).unwrap();

        let err = c.stage(ImageSource::Paste, vec![png("n2")]).unwrap_err();
        assert!(matches!(err, UploadError::CapacityExceeded { max: 3 }));
        assert_eq!(c.staged().len(), 1);

        let outcome = c.submit(&FakeStore, &RecordingTarget::default()).await.unwrap();
        assert_eq!(outcome.uploaded, 1);
        assert_eq!(
            outcome.urls,
            vec!["https://cdn.test/old1", "https://cdn.test/old2", "https://cdn.test/n1"]
        );
    }

    #[test]
    fn test_truncate_leaves_room_only_for_what_the_record_can_hold() {
        let policy = UploadPolicy { max_images: 3, overflow: OverflowPolicy::Truncate };
        let mut c = UploadController::new(policy, vec!["https://cdn.test/old1".into(), "https://cdn.test/old2".into()]);

        assert_eq!(c.stage(ImageSource::Drop, vec![png("a"), png("b")]).unwrap(), 1);
        assert_eq!(c.staged()[0].file_name, "a");

        let mut full = UploadController::new(policy, vec!["x".into(), "y".into(), "z".into()]);
        assert!(matches!(
            full.stage(ImageSource::Picker, vec![png("c")]),
            Err(UploadError::CapacityExceeded { max: 3 })
        ));
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_optimistic_view() {
        let mut c = UploadController::new(UploadPolicy::default(), vec!["https://cdn.test/old".into()]);
        c.stage(ImageSource::Picker, vec![png("new")]).unwrap();
        let target = RecordingTarget { fail: true, ..Default::default() };

        let err = c.submit(&FakeStore, &target).await.unwrap_err();

        assert!(matches!(err, UploadError::Write(ApiError::Upstream(_))));
        assert_eq!(c.view(), &ImageView::Confirmed(vec!["https://cdn.test/old".to_string()]));
        assert_eq!(c.staged().len(), 1);
        assert_eq!(c.phase(), UploadPhase::Staging);
    }

    #[tokio::test]
    async fn test_submit_without_staged_files_is_an_error() {
        let mut c = controller(3, OverflowPolicy::Reject);
        assert!(matches!(
            c.submit(&FakeStore, &RecordingTarget::default()).await,
            Err(UploadError::NothingStaged)
        ));
    }
}
