//! User-provided inputs and routing to an extraction engine.

use std::path::Path;

use serde::Serialize;

use super::error::ControllerError;
use crate::camera::Frame;

const PDF_MIME: &str = "application/pdf";
const OCTET_STREAM: &str = "application/octet-stream";

/// Which engine an input goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Image,
    Pdf,
}

/// A file handed to the controller by the display layer.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    /// MIME type declared by the uploader, if any.
    pub mime_type: Option<String>,
    /// Original file name, if known.
    pub name: Option<String>,
}

impl UploadedFile {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Default::default()
        }
    }

    pub fn with_mime(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = mime_guess::from_path(path).first().map(|m| m.to_string());
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from);
        Ok(Self {
            bytes,
            mime_type,
            name,
        })
    }

    /// Effective MIME type: the declared one unless missing or generic, then
    /// the content's magic bytes, then the file name's extension.
    pub fn resolved_mime(&self) -> String {
        let declared = self
            .mime_type
            .as_deref()
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty() && m != OCTET_STREAM);
        if let Some(mime) = declared {
            return mime;
        }

        if let Some(kind) = infer::get(&self.bytes) {
            return kind.mime_type().to_string();
        }

        self.name
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|m| m.to_string())
            .unwrap_or_else(|| OCTET_STREAM.to_string())
    }
}

/// Pick the engine for a MIME type.
///
/// PDFs go to the PDF engine and images to OCR. Anything else is handed to
/// OCR as well (the engine decides) unless `reject_unsupported` is set.
pub fn route(mime_type: &str, reject_unsupported: bool) -> Result<InputKind, ControllerError> {
    if mime_type == PDF_MIME {
        Ok(InputKind::Pdf)
    } else if mime_type.starts_with("image/") {
        Ok(InputKind::Image)
    } else if reject_unsupported {
        Err(ControllerError::UnsupportedInput(mime_type.to_string()))
    } else {
        tracing::warn!("Treating {} as an image", mime_type);
        Ok(InputKind::Image)
    }
}

/// The current input.
#[derive(Debug, Clone)]
pub enum Source {
    File {
        bytes: Vec<u8>,
        mime_type: String,
        name: Option<String>,
        kind: InputKind,
    },
    CameraFrame {
        image: Frame,
    },
}

impl Source {
    pub fn kind(&self) -> InputKind {
        match self {
            Source::File { kind, .. } => *kind,
            Source::CameraFrame { .. } => InputKind::Image,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Source::File { name, .. } => name.as_deref(),
            Source::CameraFrame { .. } => Some("captured-image.jpg"),
        }
    }

    /// Image bytes and MIME type to display, if this source is an image.
    pub fn preview(&self) -> Option<(&[u8], &str)> {
        match self {
            Source::File {
                bytes,
                mime_type,
                kind: InputKind::Image,
                ..
            } => Some((bytes.as_slice(), mime_type.as_str())),
            Source::File { .. } => None,
            Source::CameraFrame { image } => Some((image.data.as_slice(), image.mime_type)),
        }
    }

    /// Bytes handed to the extraction engine.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Source::File { bytes, .. } => bytes,
            Source::CameraFrame { image } => &image.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_declared_mime_wins() {
        let file = UploadedFile::new(PNG_MAGIC.to_vec()).with_mime("application/pdf");
        assert_eq!(file.resolved_mime(), "application/pdf");
    }

    #[test]
    fn test_declared_mime_parameters_are_stripped() {
        let file = UploadedFile::new(vec![]).with_mime("Image/PNG; charset=binary");
        assert_eq!(file.resolved_mime(), "image/png");
    }

    #[test]
    fn test_octet_stream_is_sniffed() {
        let file = UploadedFile::new(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n".to_vec())
            .with_mime("application/octet-stream");
        assert_eq!(file.resolved_mime(), "application/pdf");

        let file = UploadedFile::new(PNG_MAGIC.to_vec());
        assert_eq!(file.resolved_mime(), "image/png");
    }

    #[test]
    fn test_falls_back_to_extension() {
        let file = UploadedFile::new(b"????".to_vec()).with_name("scan.jpeg");
        assert_eq!(file.resolved_mime(), "image/jpeg");

        let file = UploadedFile::new(b"????".to_vec());
        assert_eq!(file.resolved_mime(), "application/octet-stream");
    }

    #[test]
    fn test_route() {
        assert_eq!(route("application/pdf", false).unwrap(), InputKind::Pdf);
        assert_eq!(route("image/webp", true).unwrap(), InputKind::Image);
        assert_eq!(route("text/plain", false).unwrap(), InputKind::Image);
        assert!(matches!(
            route("text/plain", true),
            Err(ControllerError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn test_pdf_source_has_no_preview() {
        let source = Source::File {
            bytes: b"%PDF".to_vec(),
            mime_type: "application/pdf".to_string(),
            name: None,
            kind: InputKind::Pdf,
        };
        assert!(source.preview().is_none());

        let source = Source::CameraFrame {
            image: Frame::jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9]),
        };
        assert_eq!(source.preview().unwrap().1, "image/jpeg");
    }
}
