/// Typed request and response bodies for the gallery API
use crate::{
    error::{GalleryError, GalleryResult},
    gallery::{Image, ImageType},
};
use axum::extract::Multipart;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// `?limit=&offset=` pagination
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LimitOffsetQuery {
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

impl LimitOffsetQuery {
    /// Validate and fill in defaults, returning `(offset, limit)`
    pub fn resolve(&self, default_limit: i64) -> GalleryResult<(i64, i64)> {
        self.validate()
            .map_err(|e| GalleryError::Validation(e.to_string()))?;
        Ok((self.offset.unwrap_or(0), self.limit.unwrap_or(default_limit)))
    }
}

/// Body of `PUT /gallery/{id}`
#[derive(Debug, Deserialize)]
pub struct UpdateImageRequest {
    pub image_new_id: i64,
}

/// Multipart body of `POST /gallery/{id}`
#[derive(Debug)]
pub struct UploadImageForm {
    pub id: Option<i64>,
    pub image_type: ImageType,
    pub file: Vec<u8>,
}

impl UploadImageForm {
    /// Read `id`, `image_type` and `file` fields; unknown fields are ignored
    pub async fn from_multipart(mut multipart: Multipart) -> GalleryResult<Self> {
        let mut id = None;
        let mut image_type = None;
        let mut file = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| GalleryError::Validation(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("id") => {
                    let text = field.text().await.map_err(|e| {
                        GalleryError::Validation(format!("Unreadable id field: {}", e))
                    })?;
                    let parsed = text.trim().parse::<i64>().map_err(|_| {
                        GalleryError::Validation(format!("Invalid id: {}", text))
                    })?;
                    id = Some(parsed);
                }
                Some("image_type") => {
                    let text = field.text().await.map_err(|e| {
                        GalleryError::Validation(format!("Unreadable image_type field: {}", e))
                    })?;
                    image_type = Some(text.trim().parse::<ImageType>()?);
                }
                Some("file") => {
                    let bytes = field.bytes().await.map_err(|e| {
                        GalleryError::Validation(format!("Unreadable file field: {}", e))
                    })?;
                    file = Some(bytes.to_vec());
                }
                _ => {}
            }
        }

        Ok(Self {
            id,
            image_type: image_type
                .ok_or_else(|| GalleryError::Validation("Missing image_type field".to_string()))?,
            file: file.ok_or_else(|| GalleryError::Validation("Missing file field".to_string()))?,
        })
    }

    /// The body id, when given, must agree with the path id
    pub fn check_id(&self, path_id: i64) -> GalleryResult<()> {
        match self.id {
            Some(body_id) if body_id != path_id => Err(GalleryError::Validation(format!(
                "Body id '{}' does not match path id '{}'",
                body_id, path_id
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FullSizeImageDetails {
    pub title: String,
    pub url: String,
}

/// Full-size image representation
#[derive(Debug, Serialize, Deserialize)]
pub struct FullSizeImageResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub image: FullSizeImageDetails,
}

impl FullSizeImageResponse {
    pub fn from_image(image: &Image, url_for: impl Fn(&str) -> String) -> Self {
        Self {
            id: image.id,
            created_at: image.created_at,
            updated_at: image.updated_at,
            image: FullSizeImageDetails {
                title: image.title(),
                url: url_for(image.primary_path()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewImageDetails {
    pub title: String,
    pub url: Option<String>,
}

/// Preview summary; `url` is null while no preview exists
#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewImageResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub image: PreviewImageDetails,
}

impl PreviewImageResponse {
    pub fn from_image(image: &Image, url_for: impl Fn(&str) -> String) -> Self {
        Self {
            id: image.id,
            created_at: image.created_at,
            updated_at: image.updated_at,
            image: PreviewImageDetails {
                title: image.title(),
                url: image.preview_path().map(url_for),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedImagesResponse {
    pub items: Vec<PreviewImageResponse>,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::ImageAssets;

    fn image(preview: Option<&str>) -> Image {
        Image {
            id: 4,
            image_type: ImageType::Human,
            assets: ImageAssets::stored(
                "images/human/ada-lopez/ada-lopez_fullsize.jpg".to_string(),
                preview.map(String::from),
            ),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_limit_offset_defaults() {
        let query = LimitOffsetQuery::default();
        assert_eq!(query.resolve(20).unwrap(), (0, 20));
    }

    #[test]
    fn test_limit_offset_bounds() {
        let zero_limit = LimitOffsetQuery {
            limit: Some(0),
            offset: None,
        };
        assert!(matches!(zero_limit.resolve(20), Err(GalleryError::Validation(_))));

        let negative_offset = LimitOffsetQuery {
            limit: Some(5),
            offset: Some(-1),
        };
        assert!(negative_offset.resolve(20).is_err());

        let ok = LimitOffsetQuery {
            limit: Some(5),
            offset: Some(10),
        };
        assert_eq!(ok.resolve(20).unwrap(), (10, 5));
    }

    #[test]
    fn test_full_size_response() {
        let response =
            FullSizeImageResponse::from_image(&image(None), |p| format!("/media/{}", p));
        assert_eq!(response.id, 4);
        assert_eq!(response.image.title, "ada-lopez");
        assert_eq!(
            response.image.url,
            "/media/images/human/ada-lopez/ada-lopez_fullsize.jpg"
        );
    }

    #[test]
    fn test_preview_response_without_preview() {
        let response = PreviewImageResponse::from_image(&image(None), |p| p.to_string());
        assert_eq!(response.image.url, None);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["image"]["url"].is_null());
    }

    #[test]
    fn test_preview_response_with_preview() {
        let response = PreviewImageResponse::from_image(
            &image(Some("images/human/ada-lopez/ada-lopez_preview.jpg")),
            |p| p.to_string(),
        );
        assert_eq!(
            response.image.url.as_deref(),
            Some("images/human/ada-lopez/ada-lopez_preview.jpg")
        );
    }

    #[test]
    fn test_check_id() {
        let form = UploadImageForm {
            id: Some(3),
            image_type: ImageType::Human,
            file: Vec::new(),
        };
        assert!(form.check_id(3).is_ok());
        assert!(form.check_id(4).is_err());
    }
}
