//! Image intake: validation and staging
//!
//! Intake owns at most one staged image at a time. Every validation starts by
//! releasing the previous preview, so a rejected upload leaves nothing staged
//! and a replaced upload never leaks its preview.

use super::file::ImageFile;
use super::preview::{PreviewEntry, PreviewHandle, PreviewStore};
use crate::config::DEFAULT_MAX_IMAGE_BYTES;
use crate::error::DescriboError;
use std::sync::Arc;

/// Descriptor of a staged image, safe to copy into conversation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    /// File name
    pub name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
    /// Local preview reference
    pub preview_url: String,
    /// Pixel dimensions, when readable
    pub dimensions: Option<(u32, u32)>,
}

/// A validated image waiting for the first turn
#[derive(Debug)]
pub struct StagedImage {
    file: Arc<ImageFile>,
    preview: PreviewHandle,
    summary: ImageSummary,
}

impl StagedImage {
    /// The validated file
    pub fn file(&self) -> &Arc<ImageFile> {
        &self.file
    }

    /// The preview reference owned by this staging
    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    /// Summary for display and state
    pub fn summary(&self) -> &ImageSummary {
        &self.summary
    }

    fn release(self) {
        self.preview.revoke();
    }
}

/// Validates candidate uploads and owns the staged image
#[derive(Debug)]
pub struct ImageIntake {
    max_bytes: u64,
    store: PreviewStore,
    staged: Option<StagedImage>,
}

impl ImageIntake {
    /// Create an intake with the given size ceiling
    pub fn new(max_bytes: u64) -> Self {
        Self::with_store(max_bytes, PreviewStore::new())
    }

    /// Create an intake registering previews in an existing store
    pub fn with_store(max_bytes: u64, store: PreviewStore) -> Self {
        Self {
            max_bytes,
            store,
            staged: None,
        }
    }

    /// Size ceiling in bytes
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// The preview registry
    pub fn store(&self) -> &PreviewStore {
        &self.store
    }

    /// Currently staged image, if any
    pub fn staged(&self) -> Option<&StagedImage> {
        self.staged.as_ref()
    }

    /// Validate and stage a candidate upload
    ///
    /// Any previously staged image is released first, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - `DescriboError::InvalidType` if the declared type is not `image/*`
    /// - `DescriboError::TooLarge` if the file exceeds the ceiling
    ///
    /// # Examples
    ///
    /// ```
    /// use describo::upload::{ImageFile, ImageIntake};
    ///
    /// let mut intake = ImageIntake::new(1024);
    /// let summary = intake
    ///     .validate(ImageFile::from_bytes("a.png", "image/png", vec![0u8; 16]))
    ///     .unwrap();
    /// assert_eq!(summary.size, 16);
    ///
    /// let rejected = intake.validate(ImageFile::from_bytes("a.txt", "text/plain", vec![1]));
    /// assert!(rejected.is_err());
    /// assert!(intake.staged().is_none());
    /// ```
    pub fn validate(&mut self, file: ImageFile) -> Result<ImageSummary, DescriboError> {
        self.reset();

        if !file.mime_type().starts_with("image/") {
            tracing::info!("Rejected {}: type {}", file.name(), file.mime_type());
            return Err(DescriboError::InvalidType(file.mime_type().to_string()));
        }

        if file.size() > self.max_bytes {
            tracing::info!(
                "Rejected {}: {} bytes over {} byte limit",
                file.name(),
                file.size(),
                self.max_bytes
            );
            return Err(DescriboError::TooLarge {
                size: file.size(),
                limit: self.max_bytes,
            });
        }

        let dimensions = file.probe_dimensions();
        let preview = self.store.create(PreviewEntry {
            name: file.name().to_string(),
            mime_type: file.mime_type().to_string(),
            size: file.size(),
            dimensions,
        });

        let summary = ImageSummary {
            name: file.name().to_string(),
            mime_type: file.mime_type().to_string(),
            size: file.size(),
            preview_url: preview.url().to_string(),
            dimensions,
        };

        tracing::info!(
            "Staged image {} ({}, {} bytes)",
            summary.name,
            summary.mime_type,
            summary.size
        );

        self.staged = Some(StagedImage {
            file: Arc::new(file),
            preview,
            summary: summary.clone(),
        });

        Ok(summary)
    }

    /// Release the staged image, if any
    ///
    /// Returns true when something was released.
    pub fn reset(&mut self) -> bool {
        match self.staged.take() {
            Some(staged) => {
                staged.release();
                true
            }
            None => false,
        }
    }
}

impl Default for ImageIntake {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_BYTES)
    }
}
