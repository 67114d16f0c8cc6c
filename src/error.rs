/// Unified error types for Sky Gallery
use crate::gallery::ImageType;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the gallery service
#[derive(Error, Debug)]
pub enum GalleryError {
    /// No image matches the requested id (and type, when given)
    #[error("{}", not_found_message(.id, .image_type))]
    NotFound {
        id: i64,
        image_type: Option<ImageType>,
    },

    /// Identifier collision on create or renumber
    #[error("Image with this id: '{0}' already exists")]
    AlreadyExists(i64),

    /// Payload could not be decoded as a raster image
    #[error("Invalid image: {0}")]
    Decode(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Blob storage errors
    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

fn not_found_message(id: &i64, image_type: &Option<ImageType>) -> String {
    match image_type {
        Some(image_type) => format!(
            "Image with id: '{}' and type: '{}' does not exist",
            id, image_type
        ),
        None => format!("Image with id: '{}' does not exist", id),
    }
}

impl GalleryError {
    pub fn not_found(id: i64) -> Self {
        GalleryError::NotFound {
            id,
            image_type: None,
        }
    }

    /// Translate a store error raised while touching the row `id`.
    ///
    /// Missing rows become `NotFound`, unique violations become `AlreadyExists`.
    pub fn from_store(err: sqlx::Error, id: i64, image_type: Option<ImageType>) -> Self {
        match err {
            sqlx::Error::RowNotFound => GalleryError::NotFound { id, image_type },
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation()
                    || db_err.message().contains("UNIQUE constraint failed") =>
            {
                GalleryError::AlreadyExists(id)
            }
            other => GalleryError::Database(other),
        }
    }
}

impl From<image::ImageError> for GalleryError {
    fn from(err: image::ImageError) -> Self {
        GalleryError::Decode(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Convert GalleryError to HTTP response
impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GalleryError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            GalleryError::AlreadyExists(_)
            | GalleryError::Decode(_)
            | GalleryError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            GalleryError::Database(_)
            | GalleryError::Io(_)
            | GalleryError::BlobStorage(_)
            | GalleryError::Internal(_) => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Result type alias for gallery operations
pub type GalleryResult<T> = Result<T, GalleryError>;
