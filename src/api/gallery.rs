/// Gallery endpoints
use crate::{
    api::extract::{GalleryJson, GalleryPath, GalleryQuery},
    api::schemas::{
        FullSizeImageResponse, LimitOffsetQuery, PaginatedImagesResponse, PreviewImageResponse,
        UpdateImageRequest, UploadImageForm,
    },
    context::AppContext,
    error::GalleryResult,
    gallery::ImageType,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

/// Build gallery routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/gallery/preview", get(list_previews))
        .route("/gallery/preview/:id", get(get_preview))
        .route("/gallery/:id", put(renumber_image).post(upload_image))
        .route("/:image_type/:id", get(get_image))
}

/// Paginated preview summaries
async fn list_previews(
    State(ctx): State<AppContext>,
    GalleryQuery(query): GalleryQuery<LimitOffsetQuery>,
) -> GalleryResult<Json<PaginatedImagesResponse>> {
    let (offset, limit) = query.resolve(ctx.config.gallery.page_size)?;

    let images = ctx.images.get_all();
    let count = images.count().await?;
    let items = images
        .slice(offset, limit)
        .await?
        .iter()
        .map(|image| PreviewImageResponse::from_image(image, |p| ctx.media_url(p)))
        .collect();

    Ok(Json(PaginatedImagesResponse { items, count }))
}

/// Preview summary for one image
async fn get_preview(
    State(ctx): State<AppContext>,
    GalleryPath(id): GalleryPath<i64>,
) -> GalleryResult<Json<PreviewImageResponse>> {
    let image = ctx.images.get_by_id(id, None).await?;
    Ok(Json(PreviewImageResponse::from_image(&image, |p| {
        ctx.media_url(p)
    })))
}

/// Change an image's id
async fn renumber_image(
    State(ctx): State<AppContext>,
    GalleryPath(id): GalleryPath<i64>,
    GalleryJson(request): GalleryJson<UpdateImageRequest>,
) -> GalleryResult<StatusCode> {
    ctx.images.renumber(id, request.image_new_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload or replace the full-size image for an id
async fn upload_image(
    State(ctx): State<AppContext>,
    GalleryPath(id): GalleryPath<i64>,
    form: UploadImageForm,
) -> GalleryResult<Json<FullSizeImageResponse>> {
    form.check_id(id)?;

    let image = ctx.images.upload(id, form.file, form.image_type).await?;
    Ok(Json(FullSizeImageResponse::from_image(&image, |p| {
        ctx.media_url(p)
    })))
}

/// Full-size image of a given type
async fn get_image(
    State(ctx): State<AppContext>,
    GalleryPath((image_type, id)): GalleryPath<(String, i64)>,
) -> GalleryResult<Json<FullSizeImageResponse>> {
    let image_type = image_type.parse::<ImageType>()?;

    let image = ctx.images.get_by_id(id, Some(image_type)).await?;
    Ok(Json(FullSizeImageResponse::from_image(&image, |p| {
        ctx.media_url(p)
    })))
}
