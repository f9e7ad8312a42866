//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
///
/// The page and the API share one origin, so no CORS headers are sent and
/// requests a browser makes on behalf of another site are refused.
pub fn create_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(handlers::index))
        // Extraction
        .route("/api/state", get(handlers::api_state))
        .route("/api/extract", post(handlers::api_extract))
        .route("/api/preview", get(handlers::api_preview))
        .route("/api/clear", post(handlers::api_clear))
        .route("/api/copy", post(handlers::api_copy))
        // Camera
        .route("/api/camera/open", post(handlers::api_camera_open))
        .route("/api/camera/capture", post(handlers::api_camera_capture))
        .route("/api/camera/close", post(handlers::api_camera_close))
        .route("/api/camera/frame", get(handlers::api_camera_frame))
        // Static assets (CSS/JS)
        .route("/static/style.css", get(handlers::serve_css))
        .route("/static/app.js", get(handlers::serve_js))
        .layer(body_limit)
        .layer(middleware::from_fn(handlers::same_origin))
        .with_state(state)
}
