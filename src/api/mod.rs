/// API routes and handlers
pub mod extract;
pub mod gallery;
pub mod health;
pub mod schemas;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(gallery::routes())
}
