/// Request extractors whose rejections are gallery errors
///
/// axum's own `Path`, `Query` and `Json` reject with plain-text bodies
/// (and `Json` with 422). These wrappers run them and turn any rejection
/// into `GalleryError::Validation`, so bad input answers 400 `{message}`.
use crate::{
    api::schemas::UploadImageForm,
    error::GalleryError,
};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

/// Path parameters
#[derive(Debug, Clone, Copy)]
pub struct GalleryPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for GalleryPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = GalleryError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| GalleryError::Validation(e.body_text()))?;
        Ok(GalleryPath(value))
    }
}

/// Query string
#[derive(Debug, Clone, Copy, Default)]
pub struct GalleryQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for GalleryQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = GalleryError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| GalleryError::Validation(e.body_text()))?;
        Ok(GalleryQuery(value))
    }
}

/// JSON body
#[derive(Debug, Clone, Copy, Default)]
pub struct GalleryJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for GalleryJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = GalleryError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| GalleryError::Validation(e.body_text()))?;
        Ok(GalleryJson(value))
    }
}

#[async_trait]
impl<S> FromRequest<S> for UploadImageForm
where
    S: Send + Sync,
{
    type Rejection = GalleryError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| GalleryError::Validation(e.body_text()))?;
        UploadImageForm::from_multipart(multipart).await
    }
}
