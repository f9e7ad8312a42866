//! JSON API for uploads, results and clipboard.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::error::ApiError;
use super::super::AppState;
use crate::controller::{ControllerSnapshot, ExtractionResult, UploadedFile};

/// Header carrying the original file name of an upload.
const FILENAME_HEADER: &str = "x-filename";

#[derive(Debug, Serialize)]
pub struct CopyResponse {
    pub copied: bool,
}

/// Current controller state.
pub async fn api_state(State(state): State<AppState>) -> Json<ControllerSnapshot> {
    Json(state.controller.snapshot().await)
}

/// Extract text from the raw request body.
///
/// The body's `Content-Type` is the declared MIME type; `X-Filename` is
/// optional and only used for display and type detection.
pub async fn api_extract(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ExtractionResult>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    }

    let mut file = UploadedFile::new(body.to_vec());
    if let Some(mime) = header_str(&headers, header::CONTENT_TYPE.as_str()) {
        file = file.with_mime(mime);
    }
    if let Some(name) = header_str(&headers, FILENAME_HEADER) {
        file = file.with_name(name);
    }

    tracing::debug!(
        "Upload of {} bytes ({})",
        file.bytes.len(),
        file.mime_type.as_deref().unwrap_or("no content type")
    );
    let result = state.controller.submit_file(file).await?;
    Ok(Json(result))
}

/// Image currently shown as the preview.
pub async fn api_preview(State(state): State<AppState>) -> Response {
    match state.controller.preview().await {
        Some((bytes, mime)) => (
            [
                (header::CONTENT_TYPE, mime),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            bytes,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "No preview").into_response(),
    }
}

/// Reset source and result.
pub async fn api_clear(State(state): State<AppState>) -> Result<Json<ControllerSnapshot>, ApiError> {
    state.controller.clear().await?;
    Ok(Json(state.controller.snapshot().await))
}

/// Copy the current text to the host clipboard.
pub async fn api_copy(State(state): State<AppState>) -> Result<Json<CopyResponse>, ApiError> {
    let copied = state.controller.copy_to_clipboard().await?;
    Ok(Json(CopyResponse { copied }))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
