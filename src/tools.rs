//! External tool discovery.
//!
//! Every engine this crate drives is a separate binary, so availability is
//! a PATH lookup.

/// Install hint for a missing `tesseract`.
pub const TESSERACT_NOT_FOUND: &str = "tesseract not found (install tesseract-ocr)";
/// Install hint for missing Poppler tools.
pub const POPPLER_NOT_FOUND: &str = "pdftotext/pdfinfo not found (install poppler-utils)";
/// Install hint for a missing `ffmpeg`.
pub const FFMPEG_NOT_FOUND: &str = "ffmpeg not found (install ffmpeg)";

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Availability of one external tool.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub purpose: &'static str,
    pub available: bool,
}

/// Check every tool used by the extraction engines.
pub fn check_tools() -> Vec<ToolStatus> {
    [
        ("tesseract", "image OCR"),
        ("pdfinfo", "PDF page count"),
        ("pdftotext", "PDF text layer"),
        ("ffmpeg", "camera capture"),
    ]
    .into_iter()
    .map(|(name, purpose)| ToolStatus {
        name,
        purpose,
        available: check_binary(name),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tools() {
        let tools = check_tools();
        assert_eq!(tools.len(), 4);
        for tool in tools {
            println!(
                "{}: {}",
                tool.name,
                if tool.available { "found" } else { "missing" }
            );
        }
    }

    #[test]
    fn test_missing_binary() {
        assert!(!check_binary("textgrab-definitely-not-a-real-binary"));
    }
}
