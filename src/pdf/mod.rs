//! PDF engine boundary.
//!
//! The engine parses a document's text layer and hands back per-page text
//! tokens; formatting and concatenation belong to the controller.

mod poppler;

use async_trait::async_trait;
use thiserror::Error;

pub use poppler::PopplerEngine;

/// Errors from PDF engines.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("Invalid PDF: {0}")]
    InvalidDocument(String),

    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: u32, count: u32 },

    #[error("Text extraction failed on page {page}: {message}")]
    PageFailed { page: u32, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text content of a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub page: u32,
    /// Text tokens in reading order.
    pub items: Vec<String>,
}

impl PageText {
    /// Join the page's tokens with single spaces.
    pub fn joined(&self) -> String {
        self.items.join(" ")
    }

    /// Whether the page has any non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.items.iter().any(|item| !item.trim().is_empty())
    }
}

/// Factory for opened PDF documents.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    /// Engine identifier (e.g. "poppler").
    fn name(&self) -> &'static str;

    /// Open a document from raw bytes.
    async fn open(&self, data: &[u8]) -> Result<Box<dyn PdfDocument>, PdfError>;
}

/// An opened PDF document.
#[async_trait]
pub trait PdfDocument: Send + Sync {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Extract the text layer of a 1-based page.
    async fn page_text(&self, page: u32) -> Result<PageText, PdfError>;
}
