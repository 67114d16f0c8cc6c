/// Disk-based blob storage backend
use crate::{
    blob_store::{validate_blob_path, BlobBackend},
    error::{GalleryError, GalleryResult},
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Disk storage backend
///
/// Stores blobs on the local filesystem under `base_path`, mirroring the
/// relative path of each blob.
#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn get_blob_path(&self, path: &str) -> GalleryResult<PathBuf> {
        validate_blob_path(path)?;
        Ok(self.base_path.join(path))
    }

    /// Ensure the directory for a blob exists
    async fn ensure_blob_dir(&self, path: &str) -> GalleryResult<PathBuf> {
        let blob_path = self.get_blob_path(path)?;
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                GalleryError::BlobStorage(format!("Failed to create blob directory: {}", e))
            })?;
        }
        Ok(blob_path)
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn put(&self, path: &str, data: Vec<u8>) -> GalleryResult<()> {
        let blob_path = self.ensure_blob_dir(path).await?;

        fs::write(&blob_path, data).await.map_err(|e| {
            GalleryError::BlobStorage(format!("Failed to write blob {}: {}", path, e))
        })?;

        Ok(())
    }

    async fn get(&self, path: &str) -> GalleryResult<Option<Vec<u8>>> {
        let blob_path = self.get_blob_path(path)?;

        match fs::read(&blob_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GalleryError::BlobStorage(format!(
                "Failed to read blob {}: {}",
                path, e
            ))),
        }
    }

    async fn delete(&self, path: &str) -> GalleryResult<()> {
        let blob_path = self.get_blob_path(path)?;

        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GalleryError::BlobStorage(format!(
                "Failed to delete blob {}: {}",
                path, e
            ))),
        }
    }

    async fn exists(&self, path: &str) -> GalleryResult<bool> {
        let blob_path = self.get_blob_path(path)?;
        fs::try_exists(&blob_path).await.map_err(|e| {
            GalleryError::BlobStorage(format!("Failed to check blob {}: {}", path, e))
        })
    }
}
