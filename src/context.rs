/// Application context and dependency injection
use crate::{
    blob_store::{BlobBackend, DiskBlobBackend},
    config::GalleryConfig,
    db,
    error::{GalleryError, GalleryResult},
    gallery::{ImageRepository, PreviewGenerator},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<GalleryConfig>,
    pub db: SqlitePool,
    pub images: Arc<ImageRepository>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: GalleryConfig) -> GalleryResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        // Initialize database
        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        // Initialize blob store and repository
        let blobs: Arc<dyn BlobBackend> =
            Arc::new(DiskBlobBackend::new(config.storage.media_root.clone()));
        let previews = PreviewGenerator::new(
            config.gallery.thumbnail_max_width,
            config.gallery.thumbnail_max_height,
        );
        let images = Arc::new(ImageRepository::new(db.clone(), blobs, previews));

        Ok(Self {
            config: Arc::new(config),
            db,
            images,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &GalleryConfig) -> GalleryResult<()> {
        let dirs = vec![&config.storage.data_directory, &config.storage.media_root];

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    GalleryError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }

    /// Public URL of a stored blob
    pub fn media_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.storage.media_url.trim_end_matches('/'),
            path
        )
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
