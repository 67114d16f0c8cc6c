/// Health check endpoints for liveness and readiness probes
///
/// Liveness only proves the process answers; readiness also checks the
/// database and the media directory.

use crate::{context::AppContext, db, error::GalleryResult};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
}

/// Basic health check
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe
pub async fn liveness_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe: 200 when the database and media root are usable, 503 otherwise
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Err(e) = db::test_connection(&ctx.db).await {
        tracing::warn!(error = %e, "readiness_probe_failed: database check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    if let Err(e) = check_media_root(&ctx).await {
        tracing::warn!(error = %e, "readiness_probe_failed: media root check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(serde_json::json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

async fn check_media_root(ctx: &AppContext) -> GalleryResult<()> {
    let metadata = tokio::fs::metadata(&ctx.config.storage.media_root).await?;
    if !metadata.is_dir() {
        return Err(crate::error::GalleryError::BlobStorage(format!(
            "{:?} is not a directory",
            ctx.config.storage.media_root
        )));
    }
    Ok(())
}
