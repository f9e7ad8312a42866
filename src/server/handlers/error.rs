//! Mapping of controller errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::controller::ControllerError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

/// Error returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    Controller(ControllerError),
    BadRequest(String),
    Forbidden(String),
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        ApiError::Controller(err)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Controller(err) => match err {
                ControllerError::Busy => (StatusCode::CONFLICT, "busy"),
                ControllerError::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
                ControllerError::NoActiveCamera => (StatusCode::CONFLICT, "no_camera"),
                ControllerError::UnsupportedInput(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported")
                }
                ControllerError::CameraUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "camera_unavailable")
                }
                ControllerError::NoFrame => (StatusCode::SERVICE_UNAVAILABLE, "no_frame"),
                ControllerError::RecognitionFailure(_) | ControllerError::PdfParseFailure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "error")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, status) = self.parts();
        let message = match self {
            ApiError::Controller(err) => err.to_string(),
            ApiError::BadRequest(msg) | ApiError::Forbidden(msg) => msg,
        };
        if code.is_server_error() {
            tracing::warn!("{}: {}", status, message);
        }
        (code, Json(ErrorBody { status, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ControllerError::Busy, StatusCode::CONFLICT),
            (
                ControllerError::UnsupportedInput("text/plain".to_string()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                ControllerError::CameraUnavailable("denied".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }

        let forbidden = ApiError::Forbidden("cross-origin".to_string()).into_response();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }
}
