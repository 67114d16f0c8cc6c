/// Gallery data models
use crate::{
    error::{GalleryError, GalleryResult},
    gallery::{naming, preview::PreviewGenerator},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Image category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    #[default]
    Human,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Human => "human",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = GalleryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(ImageType::Human),
            _ => Err(GalleryError::Validation(format!("Invalid image type: {}", s))),
        }
    }
}

/// A blob reference, optionally carrying bytes not yet written to the blob store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    path: String,
    pending: Option<Vec<u8>>,
}

impl Asset {
    /// Asset already present in the blob store
    pub fn stored(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            pending: None,
        }
    }

    fn pending(path: String, bytes: Vec<u8>) -> Self {
        Self {
            path,
            pending: Some(bytes),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bytes awaiting a blob store write
    pub fn pending_bytes(&self) -> Option<&[u8]> {
        self.pending.as_deref()
    }
}

/// A blob write produced by persisting an image
#[derive(Debug)]
pub struct PendingBlob {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Primary asset plus its derived preview.
///
/// `assign_primary_asset` only mutates data and marks the preview stale;
/// `materialize` is the explicit step that regenerates it. Loaded assets
/// start clean, so they are never re-materialized.
#[derive(Debug, Clone)]
pub struct ImageAssets {
    primary: Asset,
    preview: Option<Asset>,
    dirty_for_preview: bool,
}

impl ImageAssets {
    /// Freshly uploaded primary asset, preview not generated yet
    pub fn new(image_type: ImageType, derived_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            primary: Asset::pending(naming::primary_path(image_type, derived_name), bytes),
            preview: None,
            dirty_for_preview: true,
        }
    }

    /// Assets as loaded from the store
    pub fn stored(primary_path: String, preview_path: Option<String>) -> Self {
        Self {
            primary: Asset::stored(primary_path),
            preview: preview_path.map(Asset::stored),
            dirty_for_preview: false,
        }
    }

    pub fn primary(&self) -> &Asset {
        &self.primary
    }

    pub fn preview(&self) -> Option<&Asset> {
        self.preview.as_ref()
    }

    pub fn is_dirty_for_preview(&self) -> bool {
        self.dirty_for_preview
    }

    /// Replace the primary asset. The old preview is dropped immediately.
    pub fn assign_primary_asset(&mut self, image_type: ImageType, derived_name: &str, bytes: Vec<u8>) {
        self.primary = Asset::pending(naming::primary_path(image_type, derived_name), bytes);
        self.preview = None;
        self.dirty_for_preview = true;
    }

    /// Regenerate the preview if the primary asset changed since the last run.
    ///
    /// On failure the assets stay dirty and nothing may be persisted.
    pub fn materialize(&mut self, image_type: ImageType, generator: &PreviewGenerator) -> GalleryResult<()> {
        if !self.dirty_for_preview {
            return Ok(());
        }

        let primary = self.primary.pending_bytes().ok_or_else(|| {
            GalleryError::Internal(format!(
                "Primary asset {} has no payload to preview",
                self.primary.path
            ))
        })?;

        let preview = generator.generate_preview(primary)?;
        let path = naming::preview_path(image_type, &self.title());

        self.preview = Some(Asset::pending(path, preview.bytes));
        self.dirty_for_preview = false;

        Ok(())
    }

    /// Title derived from the primary asset path
    pub fn title(&self) -> String {
        naming::title_from_path(&self.primary.path)
    }

    /// Every path currently referenced
    pub fn paths(&self) -> Vec<String> {
        let mut paths = vec![self.primary.path.clone()];
        if let Some(preview) = &self.preview {
            paths.push(preview.path.clone());
        }
        paths
    }

    /// Hand over unwritten payloads. Refuses while the preview is stale.
    pub(crate) fn take_pending(&mut self) -> GalleryResult<Vec<PendingBlob>> {
        if self.dirty_for_preview {
            return Err(GalleryError::Internal(
                "Image must be materialized before it is persisted".to_string(),
            ));
        }

        let mut blobs = Vec::new();
        for asset in std::iter::once(&mut self.primary).chain(self.preview.as_mut()) {
            if let Some(bytes) = asset.pending.take() {
                blobs.push(PendingBlob {
                    path: asset.path.clone(),
                    bytes,
                });
            }
        }

        Ok(blobs)
    }
}

/// A persisted gallery image
#[derive(Debug, Clone)]
pub struct Image {
    pub id: i64,
    pub image_type: ImageType,
    pub assets: ImageAssets,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    pub fn title(&self) -> String {
        self.assets.title()
    }

    pub fn primary_path(&self) -> &str {
        self.assets.primary().path()
    }

    pub fn preview_path(&self) -> Option<&str> {
        self.assets.preview().map(Asset::path)
    }

    pub fn assign_primary_asset(&mut self, derived_name: &str, bytes: Vec<u8>) {
        self.assets
            .assign_primary_asset(self.image_type, derived_name, bytes);
    }

    pub fn materialize(&mut self, generator: &PreviewGenerator) -> GalleryResult<()> {
        self.assets.materialize(self.image_type, generator)
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image [{}] {}", self.id, self.primary_path())
    }
}
