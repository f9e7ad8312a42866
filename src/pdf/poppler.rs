//! PDF text extraction via Poppler's `pdfinfo` and `pdftotext`.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;

use super::{PageText, PdfDocument, PdfEngine, PdfError};
use crate::tools::POPPLER_NOT_FOUND;

/// How far into the file the `%PDF` header may start.
const HEADER_SEARCH_LEN: usize = 1024;

/// PDF engine backed by poppler-utils.
#[derive(Debug, Default, Clone)]
pub struct PopplerEngine;

impl PopplerEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PdfEngine for PopplerEngine {
    fn name(&self) -> &'static str {
        "poppler"
    }

    async fn open(&self, data: &[u8]) -> Result<Box<dyn PdfDocument>, PdfError> {
        if !has_pdf_header(data) {
            return Err(PdfError::InvalidDocument(
                "missing %PDF header".to_string(),
            ));
        }

        let workdir = TempDir::with_prefix("textgrab-pdf")?;
        let path = workdir.path().join("document.pdf");
        tokio::fs::write(&path, data).await?;

        let page_count = read_page_count(&path).await?;
        tracing::debug!("Opened PDF with {} pages", page_count);

        Ok(Box::new(PopplerDocument {
            _workdir: workdir,
            path,
            page_count,
        }))
    }
}

struct PopplerDocument {
    // Keeps the copied file alive for the document's lifetime.
    _workdir: TempDir,
    path: PathBuf,
    page_count: u32,
}

#[async_trait]
impl PdfDocument for PopplerDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    async fn page_text(&self, page: u32) -> Result<PageText, PdfError> {
        if page == 0 || page > self.page_count {
            return Err(PdfError::PageOutOfRange {
                page,
                count: self.page_count,
            });
        }

        let page_str = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
            .arg(&self.path)
            .arg("-") // Output to stdout
            .output()
            .await;

        let stdout = handle_output(output).map_err(|e| match e {
            PdfError::InvalidDocument(message) => PdfError::PageFailed { page, message },
            other => other,
        })?;

        Ok(PageText {
            page,
            items: split_items(&stdout),
        })
    }
}

/// Readers tolerate junk before the header as long as it starts early.
fn has_pdf_header(data: &[u8]) -> bool {
    data[..data.len().min(HEADER_SEARCH_LEN)]
        .windows(4)
        .any(|window| window == b"%PDF")
}

/// Get the page count of a PDF from `pdfinfo`.
async fn read_page_count(path: &Path) -> Result<u32, PdfError> {
    let output = Command::new("pdfinfo").arg(path).output().await;
    let stdout = handle_output(output)?;
    parse_page_count(&stdout)
        .ok_or_else(|| PdfError::InvalidDocument("pdfinfo reported no page count".to_string()))
}

fn parse_page_count(pdfinfo: &str) -> Option<u32> {
    pdfinfo
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Break pdftotext output into text items, one per non-blank line.
fn split_items(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn handle_output(result: std::io::Result<Output>) -> Result<String, PdfError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(PdfError::InvalidDocument(stderr.trim().to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
            PdfError::BackendNotAvailable(POPPLER_NOT_FOUND.to_string()),
        ),
        Err(e) => Err(PdfError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_count() {
        let info = "Title:          Report\nProducer:       LaTeX\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(12));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    #[test]
    fn test_split_items_drops_blank_lines_and_form_feed() {
        let items = split_items("Hello\n\n  World  \n\x0c");
        assert_eq!(items, vec!["Hello", "World"]);
    }

    #[test]
    fn test_pdf_header_may_follow_leading_bytes() {
        assert!(has_pdf_header(b"%PDF-1.7\n"));

        let mut shifted = vec![0u8; 512];
        shifted.extend_from_slice(b"%PDF-1.4\n");
        assert!(has_pdf_header(&shifted));

        let mut too_late = vec![b' '; HEADER_SEARCH_LEN];
        too_late.extend_from_slice(b"%PDF-1.4\n");
        assert!(!has_pdf_header(&too_late));

        assert!(!has_pdf_header(b"%PD"));
    }

    #[tokio::test]
    async fn test_open_rejects_non_pdf() {
        let engine = PopplerEngine::new();
        let err = engine.open(b"GIF89a...").await.err().unwrap();
        assert!(matches!(err, PdfError::InvalidDocument(_)));
    }
}
