use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod upload;

// Routing split by access level (Public, Admin).
pub mod routes;
use auth::AuthUser;
use error::ApiError;
use routes::{admin, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use upload::{DiskStorage, MockStorageService, StorageState};

/// ApiDoc
///
/// OpenAPI document for every routed handler, served at `/api-docs/openapi.json` and
/// browsable through the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_publications, handlers::list_gallery_photos,
        handlers::list_gallery_videos, handlers::list_circulars, handlers::list_archives,
        handlers::create_publication, handlers::update_publication,
        handlers::delete_publication, handlers::create_gallery_photo,
        handlers::delete_gallery_photo, handlers::create_gallery_video,
        handlers::delete_gallery_video, handlers::create_circular, handlers::update_circular,
        handlers::delete_circular, handlers::create_archive, handlers::update_archive,
        handlers::delete_archive, handlers::list_homepage_officials,
        handlers::list_carousel_images, handlers::create_homepage_official,
        handlers::delete_homepage_official, handlers::create_carousel_image,
        handlers::delete_carousel_image
    ),
    components(
        schemas(
            models::Publication, models::GalleryPhoto, models::GalleryVideo,
            models::Circular, models::Archive, models::HomepageOfficial,
            models::CarouselImage, models::DeleteCarouselRequest, models::UploadResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "site-cms", description = "Institutional CMS content API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container shared by every request: database access, file
/// storage and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: relational store for content rows and the token blocklist.
    pub repo: RepositoryState,
    /// Storage Layer: the Upload Guard's persister.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Runs the `AuthUser` extractor before any admin handler. A failed check rejects the
/// request with the extractor's `ApiError`, so the handler (and the multipart body) is
/// never touched.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

// Applied to every response, including static files and errors.
const SECURITY_HEADERS: [(&str, &str); 13] = [
    (
        "content-security-policy",
        "default-src 'self'; script-src 'self'; style-src 'self'; img-src 'self' data:; \
         font-src 'self'; connect-src 'self'; frame-ancestors 'none'; object-src 'none';",
    ),
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "no-referrer"),
    (
        "strict-transport-security",
        "max-age=63072000; includeSubDomains; preload",
    ),
    (
        "permissions-policy",
        "geolocation=(), microphone=(), camera=(), fullscreen=(self), payment=()",
    ),
    ("cross-origin-resource-policy", "same-origin"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-embedder-policy", "require-corp"),
    ("expect-ct", "max-age=86400, enforce"),
    (
        "cache-control",
        "no-store, no-cache, must-revalidate, proxy-revalidate",
    ),
    ("pragma", "no-cache"),
    ("expires", "0"),
];

fn with_security_headers(router: Router) -> Router {
    SECURITY_HEADERS
        .iter()
        .fold(router, |router, &(name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            ))
        })
}

/// cors_layer
///
/// Restricts cross-origin access to `CORS_ORIGIN` when it is configured. An origin that
/// is not a valid header value disables cross-origin access instead of widening it.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match config.cors_origin.as_deref() {
        None => cors.allow_origin(Any),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(origin) => cors.allow_origin(AllowOrigin::exact(origin)),
            Err(e) => {
                tracing::error!(origin, error = ?e, "CORS_ORIGIN is not a valid header value");
                cors
            }
        },
    }
}

/// create_router
///
/// Assembles routing, static file serving and global middleware, then registers state.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let x_request_id = HeaderName::from_static("x-request-id");

    // Stored uploads resolve at the relative URLs returned by the persister.
    let images = ServeDir::new(state.config.storage_root.join("images"));
    let pdfs = ServeDir::new(state.config.storage_root.join("pdfs"));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Admin Routes: every request passes the `AuthUser` gate first.
        .merge(
            admin::admin_routes(&state.config.upload_limits).route_layer(
                middleware::from_fn_with_state(state.clone(), auth_middleware),
            ),
        )
        .nest_service("/images", images)
        .nest_service("/pdfs", pdfs)
        .fallback(route_not_found)
        .with_state(state);

    with_security_headers(base_router)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`: method, URI and the generated `x-request-id`, so every log line
/// of one request (including Upload Guard rejections) can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
