/// Configuration management for Sky Gallery
use crate::error::{GalleryError, GalleryResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub gallery: GallerySettings,
    pub download: DownloadConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub max_upload_size: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub media_root: PathBuf,
    /// URL prefix under which stored blobs are served
    pub media_url: String,
}

/// Gallery behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GallerySettings {
    pub page_size: i64,
    pub thumbnail_max_width: u32,
    pub thumbnail_max_height: u32,
}

/// Bulk download source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    pub human_image_source_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    /// Subscriber filter for `level`, falling back to `info` on a bad directive
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|e| {
            eprintln!("Ignoring invalid RUST_LOG '{}': {}", self.level, e);
            EnvFilter::new("info")
        })
    }
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            thumbnail_max_width: 200,
            thumbnail_max_height: 200,
        }
    }
}

impl GalleryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> GalleryResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("GALLERY_HOSTNAME").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("GALLERY_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| GalleryError::Validation("Invalid port number".to_string()))?;
        let max_upload_size = env::var("GALLERY_MAX_UPLOAD_SIZE")
            .unwrap_or_else(|_| "10485760".to_string())
            .parse()
            .unwrap_or(10 * 1024 * 1024);

        let data_directory: PathBuf = env::var("GALLERY_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("GALLERY_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("gallery.sqlite"));
        let media_root = env::var("GALLERY_MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("media"));
        let media_url = env::var("GALLERY_MEDIA_URL").unwrap_or_else(|_| "/media".to_string());

        let defaults = GallerySettings::default();
        let page_size = env::var("GALLERY_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.page_size);
        let thumbnail_max_width = env::var("GALLERY_THUMBNAIL_MAX_WIDTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.thumbnail_max_width);
        let thumbnail_max_height = env::var("GALLERY_THUMBNAIL_MAX_HEIGHT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.thumbnail_max_height);

        let human_image_source_url = env::var("GALLERY_HUMAN_IMAGE_SOURCE_URL")
            .unwrap_or_else(|_| "https://thispersondoesnotexist.com".to_string());

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(GalleryConfig {
            service: ServiceConfig {
                hostname,
                port,
                max_upload_size,
            },
            storage: StorageConfig {
                data_directory,
                database,
                media_root,
                media_url,
            },
            gallery: GallerySettings {
                page_size,
                thumbnail_max_width,
                thumbnail_max_height,
            },
            download: DownloadConfig {
                human_image_source_url,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Configuration rooted in a single directory, used by tests and tooling
    pub fn with_data_directory(data_directory: PathBuf) -> Self {
        Self {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 8000,
                max_upload_size: 10 * 1024 * 1024,
            },
            storage: StorageConfig {
                database: data_directory.join("gallery.sqlite"),
                media_root: data_directory.join("media"),
                media_url: "/media".to_string(),
                data_directory,
            },
            gallery: GallerySettings::default(),
            download: DownloadConfig {
                human_image_source_url: "https://thispersondoesnotexist.com".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> GalleryResult<()> {
        if self.service.hostname.is_empty() {
            return Err(GalleryError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.service.max_upload_size == 0 {
            return Err(GalleryError::Validation(
                "Upload size limit must be positive".to_string(),
            ));
        }

        if self.gallery.page_size < 1 {
            return Err(GalleryError::Validation(
                "Page size must be at least 1".to_string(),
            ));
        }

        if self.gallery.thumbnail_max_width == 0 || self.gallery.thumbnail_max_height == 0 {
            return Err(GalleryError::Validation(
                "Thumbnail bounds must be at least 1x1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_defaults_validate() {
        let config = GalleryConfig::with_data_directory(PathBuf::from("/tmp/gallery"));
        assert!(config.validate().is_ok());
        assert_eq!(config.gallery.page_size, 20);
        assert_eq!(config.gallery.thumbnail_max_width, 200);
        assert_eq!(
            config.storage.database,
            PathBuf::from("/tmp/gallery/gallery.sqlite")
        );
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let mut config = GalleryConfig::with_data_directory(PathBuf::from("/tmp/gallery"));
        config.gallery.page_size = 0;
        assert!(matches!(config.validate(), Err(GalleryError::Validation(_))));
    }

    #[test]
    fn test_rejects_empty_thumbnail_bounds() {
        let mut config = GalleryConfig::with_data_directory(PathBuf::from("/tmp/gallery"));
        config.gallery.thumbnail_max_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_drives_filter() {
        let logging = LoggingConfig {
            level: "sky_gallery=debug,tower_http=warn".to_string(),
        };
        assert_eq!(logging.env_filter().max_level_hint(), Some(LevelFilter::DEBUG));

        let invalid = LoggingConfig {
            level: "sky_gallery=loudest".to_string(),
        };
        assert_eq!(invalid.env_filter().max_level_hint(), Some(LevelFilter::INFO));
    }
}
