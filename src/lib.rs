//! Sky Gallery - image gallery service
//!
//! Lists, previews, uploads and renumbers gallery images. Uploaded images
//! are stored in a blob store next to a generated JPEG preview; rows live
//! in SQLite.

pub mod api;
pub mod blob_store;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod gallery;
pub mod server;
