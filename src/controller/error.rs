//! Controller error taxonomy.

use thiserror::Error;

use super::state::{TransitionError, UiState};

/// Errors surfaced by controller operations.
///
/// `RecognitionFailure` and `PdfParseFailure` never escape `submit_file` or
/// `capture_frame`: they are published as the result text instead.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(
        "Camera access failed: {0}. Make sure the page is served over HTTPS (or localhost), \
         camera permission has been granted, and a camera is connected."
    )]
    CameraUnavailable(String),

    #[error("Error extracting image text: {0}")]
    RecognitionFailure(String),

    #[error("Error extracting PDF text: {0}")]
    PdfParseFailure(String),

    #[error("An extraction is already in progress")]
    Busy,

    #[error("No camera is open")]
    NoActiveCamera,

    #[error("The camera has not produced a frame yet")]
    NoFrame,

    #[error("Unsupported file type: {0}")]
    UnsupportedInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(TransitionError),
}

impl From<TransitionError> for ControllerError {
    fn from(err: TransitionError) -> Self {
        if err.from == UiState::Extracting {
            ControllerError::Busy
        } else {
            ControllerError::InvalidState(err)
        }
    }
}
