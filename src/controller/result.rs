//! Extraction results and their text formatting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::ControllerError;
use super::source::InputKind;
use crate::pdf::PageText;

/// Text shown before anything has been extracted.
pub const INITIAL_TEXT: &str = "Upload an image or PDF to extract text...";
/// Text shown while an extraction is running.
pub const EXTRACTING_TEXT: &str = "Extracting text...";
/// Text for an image with no recognizable text.
pub const NO_TEXT_IN_IMAGE: &str = "No text found.";
/// Text for a PDF without any text layer content.
pub const NO_TEXT_IN_PDF: &str = "No text found in PDF.";
/// Marker prefixed to failure messages.
pub const FAILURE_MARKER: &str = "❌";

/// What the display layer shows in the text area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub text: String,
    /// Engine failure message, if the extraction failed.
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<InputKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_at: Option<DateTime<Utc>>,
}

impl ExtractionResult {
    /// The placeholder result before any extraction.
    pub fn initial() -> Self {
        Self::placeholder(INITIAL_TEXT)
    }

    /// The placeholder result while an extraction runs.
    pub fn in_progress() -> Self {
        Self::placeholder(EXTRACTING_TEXT)
    }

    fn placeholder(text: &str) -> Self {
        Self {
            text: text.to_string(),
            error: None,
            kind: None,
            page_count: None,
            extracted_at: None,
        }
    }

    pub fn success(kind: InputKind, text: String, page_count: Option<u32>) -> Self {
        Self {
            text,
            error: None,
            kind: Some(kind),
            page_count,
            extracted_at: Some(Utc::now()),
        }
    }

    /// A failed extraction: the message goes to `error`, the marked-up
    /// failure string replaces the text.
    pub fn failure(kind: InputKind, err: &ControllerError) -> Self {
        let message = match err {
            ControllerError::RecognitionFailure(msg) | ControllerError::PdfParseFailure(msg) => {
                msg.clone()
            }
            other => other.to_string(),
        };
        Self {
            text: format!("{} {}", FAILURE_MARKER, err),
            error: Some(message),
            kind: Some(kind),
            page_count: None,
            extracted_at: Some(Utc::now()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

impl Default for ExtractionResult {
    fn default() -> Self {
        Self::initial()
    }
}

/// Text recognized in an image, or the no-text placeholder.
pub fn image_text(recognized: &str) -> String {
    if recognized.trim().is_empty() {
        NO_TEXT_IN_IMAGE.to_string()
    } else {
        recognized.to_string()
    }
}

/// Concatenate pages in order under `--- Page N ---` headers.
///
/// Returns the no-text placeholder when no page has any text at all.
pub fn format_pages(pages: &[PageText]) -> String {
    if !pages.iter().any(PageText::has_text) {
        return NO_TEXT_IN_PDF.to_string();
    }

    let mut text = String::new();
    for page in pages {
        text.push_str(&format!("--- Page {} ---\n{}\n\n", page.page, page.joined()));
    }
    text
}
