/// Preview (thumbnail) generation
use crate::error::GalleryResult;
use image::{DynamicImage, GenericImageView, ImageFormat};

/// Logical file name carried by every generated preview
pub const PREVIEW_FILE_NAME: &str = "preview.jpg";

/// Encoded thumbnail produced from a primary asset
#[derive(Debug, Clone)]
pub struct PreviewPayload {
    pub name: &'static str,
    pub bytes: Vec<u8>,
}

/// Turns primary image bytes into a bounded JPEG thumbnail.
///
/// Aspect ratio is preserved and images already inside the bounds are
/// re-encoded at their original size, never upscaled. No I/O is performed.
#[derive(Debug, Clone, Copy)]
pub struct PreviewGenerator {
    max_width: u32,
    max_height: u32,
}

impl Default for PreviewGenerator {
    fn default() -> Self {
        Self::new(200, 200)
    }
}

impl PreviewGenerator {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
        }
    }

    /// Decode `primary`, shrink it into the bounds and encode as JPEG.
    ///
    /// Fails with `GalleryError::Decode` when `primary` is not a decodable raster image.
    pub fn generate_preview(&self, primary: &[u8]) -> GalleryResult<PreviewPayload> {
        let img = image::load_from_memory(primary)?;

        let thumb = self.shrink(&img);

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(thumb.to_rgb8());

        let mut bytes = Vec::new();
        rgb.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Jpeg)?;

        tracing::debug!(
            "Generated {}x{} preview from {}x{} image",
            rgb.width(),
            rgb.height(),
            img.width(),
            img.height()
        );

        Ok(PreviewPayload {
            name: PREVIEW_FILE_NAME,
            bytes,
        })
    }

    fn shrink(&self, img: &DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        if width <= self.max_width && height <= self.max_height {
            return img.clone();
        }

        img.thumbnail(self.max_width, self.max_height)
    }
}
