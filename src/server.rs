/// HTTP server setup and routing
use crate::{
    context::AppContext,
    error::{ErrorResponse, GalleryError, GalleryResult},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    response::Json,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    let mut router = crate::api::routes();

    // Serve stored blobs when the media URL is local to this service
    let media_url = ctx.config.storage.media_url.trim_end_matches('/').to_string();
    if media_url.starts_with('/') && media_url.len() > 1 {
        router = router.nest_service(
            &media_url,
            ServeDir::new(&ctx.config.storage.media_root),
        );
    }

    let body_limit = ctx.config.service.max_upload_size;

    router
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "Endpoint not found".to_string(),
        }),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> GalleryResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Sky Gallery listening on {}", addr);
    info!("   Service URL: {}", ctx.service_url());
    info!("   Media root: {:?}", ctx.config.storage.media_root);

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GalleryError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| GalleryError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
