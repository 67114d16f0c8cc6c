/// Image gallery core
///
/// The image entity and its preview lifecycle, the preview generator, and
/// the repository persisting images to SQLite and the blob store.

pub mod models;
pub mod naming;
pub mod preview;
pub mod repository;

pub use models::{Asset, Image, ImageAssets, ImageType};
pub use preview::{PreviewGenerator, PreviewPayload};
pub use repository::{ImageRepository, ImageSet};
