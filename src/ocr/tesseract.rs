//! Tesseract OCR engine.
//!
//! Drives the `tesseract` command-line tool. Each session owns a temp
//! directory for its input image, removed on dispose.

use std::path::Path;
use std::process::Output;
use std::time::Instant;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;

use super::backend::{OcrConfig, OcrEngine, OcrError, OcrResult, OcrSession};
use crate::tools::{check_binary, TESSERACT_NOT_FOUND};

/// OCR engine wrapping the `tesseract` CLI tool.
#[derive(Debug, Default, Clone)]
pub struct TesseractEngine;

impl TesseractEngine {
    pub fn new() -> Self {
        Self
    }

    /// List language packs known to the installed tesseract.
    pub async fn installed_languages() -> Result<Vec<String>, OcrError> {
        let output = Command::new("tesseract").arg("--list-langs").output().await;
        let stdout = handle_output(output, "tesseract --list-langs failed")?;

        // First line is a header: List of available languages in "/usr/share/..." (N):
        Ok(stdout
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            "Tesseract is available".to_string()
        } else {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        }
    }

    async fn create(&self) -> Result<Box<dyn OcrSession>, OcrError> {
        let workdir = TempDir::with_prefix("textgrab-ocr")?;
        Ok(Box::new(TesseractSession {
            workdir,
            config: None,
        }))
    }
}

struct TesseractSession {
    workdir: TempDir,
    config: Option<OcrConfig>,
}

#[async_trait]
impl OcrSession for TesseractSession {
    async fn configure(&mut self, config: &OcrConfig) -> Result<(), OcrError> {
        if let Some(ref dir) = config.tessdata_dir {
            if !dir.is_dir() {
                return Err(OcrError::BackendNotAvailable(format!(
                    "tessdata directory not found: {}",
                    dir.display()
                )));
            }
        }
        self.config = Some(config.clone());
        Ok(())
    }

    async fn recognize(&mut self, image: &[u8]) -> Result<OcrResult, OcrError> {
        let config = self.config.as_ref().ok_or(OcrError::NotConfigured)?;
        let start = Instant::now();

        let extension = infer::get(image)
            .map(|kind| kind.extension())
            .unwrap_or("png");
        let input_path = self.workdir.path().join(format!("input.{}", extension));
        tokio::fs::write(&input_path, image).await?;

        let text = run_tesseract(&input_path, config).await?;

        Ok(OcrResult {
            text,
            languages: config.languages.clone(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn dispose(self: Box<Self>) {
        let path = self.workdir.path().to_path_buf();
        if let Err(e) = self.workdir.close() {
            tracing::debug!("Failed to remove OCR workdir {}: {}", path.display(), e);
        }
    }
}

/// Run Tesseract on an image file, reading the text from stdout.
async fn run_tesseract(image_path: &Path, config: &OcrConfig) -> Result<String, OcrError> {
    let mut cmd = Command::new("tesseract");
    cmd.arg(image_path)
        .arg("stdout")
        .args(["-l", &config.languages.to_string()]);
    if let Some(ref dir) = config.tessdata_dir {
        cmd.arg("--tessdata-dir").arg(dir);
    }

    tracing::debug!(
        "Running tesseract on {} ({})",
        image_path.display(),
        config.languages
    );
    handle_output(cmd.output().await, "tesseract failed")
}

fn handle_output(result: std::io::Result<Output>, error_prefix: &str) -> Result<String, OcrError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(OcrError::OcrFailed(format!(
                "{}: {}",
                error_prefix,
                stderr.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
            OcrError::BackendNotAvailable(TESSERACT_NOT_FOUND.to_string()),
        ),
        Err(e) => Err(OcrError::Io(e)),
    }
}
