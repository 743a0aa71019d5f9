use crate::{AppState, config::UploadLimits, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, post},
};

/// Admin Router Module
///
/// Content management endpoints. Every write that carries files goes through the Upload
/// Guard inside the handler: receive, validate, persist, then the database write.
///
/// Access Control:
/// `create_router` wraps this router in the `AuthUser` middleware. Handlers also take
/// `AuthUser` so the acting admin is available for audit logging.
///
/// The request body ceiling is raised from axum's 2 MB default to the configured
/// multipart ceiling. Per-file ceilings are enforced by the receiver.
pub fn admin_routes(limits: &UploadLimits) -> Router<AppState> {
    Router::new()
        // --- Publications: cover image + PDF ---
        .route("/publications", post(handlers::create_publication))
        .route(
            "/publications/{id}",
            delete(handlers::delete_publication).put(handlers::update_publication),
        )
        // --- Gallery ---
        .route("/gallery/photos", post(handlers::create_gallery_photo))
        .route("/gallery/photos/{id}", delete(handlers::delete_gallery_photo))
        .route("/gallery/videos", post(handlers::create_gallery_video))
        .route("/gallery/videos/{id}", delete(handlers::delete_gallery_video))
        // --- Circulars & Archives: single PDF each ---
        .route("/manage/circulars", post(handlers::create_circular))
        .route(
            "/manage/circulars/{id}",
            delete(handlers::delete_circular).put(handlers::update_circular),
        )
        .route("/manage/archives", post(handlers::create_archive))
        .route(
            "/manage/archives/{id}",
            delete(handlers::delete_archive).put(handlers::update_archive),
        )
        // --- Homepage: single image each ---
        .route("/homepage/officials", post(handlers::create_homepage_official))
        .route(
            "/homepage/officials/{id}",
            delete(handlers::delete_homepage_official),
        )
        .route(
            "/homepage/carousel",
            post(handlers::create_carousel_image).delete(handlers::delete_carousel_image),
        )
        .layer(DefaultBodyLimit::max(limits.max_request_bytes))
}
