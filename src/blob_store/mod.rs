/// Blob Storage System
///
/// Stores image payloads at caller-chosen relative paths
/// (e.g. `images/human/jane-doe/jane-doe_fullsize.jpg`).

pub mod disk;

pub use disk::DiskBlobBackend;

use crate::error::{GalleryError, GalleryResult};
use async_trait::async_trait;
use std::path::{Component, Path};

/// Blob storage backend trait
///
/// Implementations handle the actual storage and retrieval of blob data.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Store a blob at the given relative path, replacing any previous payload
    async fn put(&self, path: &str, data: Vec<u8>) -> GalleryResult<()>;

    /// Retrieve a blob by path
    async fn get(&self, path: &str) -> GalleryResult<Option<Vec<u8>>>;

    /// Delete a blob by path. Missing blobs are not an error.
    async fn delete(&self, path: &str) -> GalleryResult<()>;

    /// Check if a blob exists
    async fn exists(&self, path: &str) -> GalleryResult<bool>;
}

/// Reject absolute paths and anything that could escape the store root
pub fn validate_blob_path(path: &str) -> GalleryResult<()> {
    if path.is_empty() {
        return Err(GalleryError::BlobStorage("Empty blob path".to_string()));
    }

    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(GalleryError::BlobStorage(format!(
            "Invalid blob path: {}",
            path
        )));
    }

    Ok(())
}
