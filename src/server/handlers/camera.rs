//! Camera session handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::error::ApiError;
use super::super::AppState;
use crate::controller::{ControllerSnapshot, ExtractionResult};

pub async fn api_camera_open(
    State(state): State<AppState>,
) -> Result<Json<ControllerSnapshot>, ApiError> {
    state.controller.open_camera().await?;
    Ok(Json(state.controller.snapshot().await))
}

/// Capture the live frame and extract its text. Always closes the camera.
pub async fn api_camera_capture(
    State(state): State<AppState>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let result = state.controller.capture_frame().await?;
    Ok(Json(result))
}

pub async fn api_camera_close(State(state): State<AppState>) -> Json<ControllerSnapshot> {
    state.controller.close_camera().await;
    Json(state.controller.snapshot().await)
}

/// Latest live frame, polled by the page for the camera preview.
pub async fn api_camera_frame(State(state): State<AppState>) -> Response {
    match state.controller.latest_camera_frame() {
        Some(frame) => (
            [
                (header::CONTENT_TYPE, frame.mime_type),
                (header::CACHE_CONTROL, "no-store"),
            ],
            frame.data,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "No camera frame").into_response(),
    }
}
