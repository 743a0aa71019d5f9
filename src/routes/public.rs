use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only endpoints consumed by the public site. Stored files themselves are served
/// by the static file services mounted in `create_router`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /content/publications
        .route("/content/publications", get(handlers::list_publications))
        // GET /content/gallery/photos, /content/gallery/videos
        // Both ordered by date, newest first.
        .route("/content/gallery/photos", get(handlers::list_gallery_photos))
        .route("/content/gallery/videos", get(handlers::list_gallery_videos))
        // GET /content/circulars?year=...&start_date=...&end_date=...
        .route("/content/circulars", get(handlers::list_circulars))
        // GET /content/archives?year=...&start_date=...&end_date=...
        .route("/content/archives", get(handlers::list_archives))
        // GET /content/homepage/officials, /content/homepage/carousel
        // Both ordered by display_order; officials capped at three.
        .route(
            "/content/homepage/officials",
            get(handlers::list_homepage_officials),
        )
        .route("/content/homepage/carousel", get(handlers::list_carousel_images))
}
