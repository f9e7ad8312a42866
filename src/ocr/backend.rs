//! OCR engine abstraction.
//!
//! An engine hands out short-lived sessions. A session follows the
//! lifecycle create → configure → recognize → dispose and is never reused
//! across recognitions.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from OCR engines.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Invalid language profile: {0}")]
    InvalidLanguage(String),

    #[error("Session used before configure()")]
    NotConfigured,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a single recognition.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Recognized text, as returned by the engine.
    pub text: String,
    /// Language profile the engine ran with.
    pub languages: LanguageProfile,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Set of languages recognized simultaneously (e.g. `eng+ara+fra`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile(Vec<String>);

impl LanguageProfile {
    pub fn new<I, S>(languages: I) -> Result<Self, OcrError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let languages: Vec<String> = languages.into_iter().map(Into::into).collect();
        if languages.is_empty() {
            return Err(OcrError::InvalidLanguage(
                "at least one language is required".to_string(),
            ));
        }
        for lang in &languages {
            let valid = !lang.is_empty()
                && lang
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !valid {
                return Err(OcrError::InvalidLanguage(format!(
                    "'{}' is not a language code",
                    lang
                )));
            }
        }
        Ok(Self(languages))
    }

    pub fn languages(&self) -> &[String] {
        &self.0
    }
}

impl Default for LanguageProfile {
    /// English, Arabic and French, recognized together.
    fn default() -> Self {
        Self(vec!["eng".to_string(), "ara".to_string(), "fra".to_string()])
    }
}

impl fmt::Display for LanguageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("+"))
    }
}

impl FromStr for LanguageProfile {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(
            s.split(['+', ','])
                .map(str::trim)
                .filter(|part| !part.is_empty()),
        )
    }
}

/// Configuration applied to every OCR session.
#[derive(Debug, Clone, Default)]
pub struct OcrConfig {
    /// Languages active for recognition.
    pub languages: LanguageProfile,
    /// Custom tessdata directory, if the language data is not installed system-wide.
    pub tessdata_dir: Option<PathBuf>,
}

/// Factory for OCR sessions.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine identifier (e.g. "tesseract").
    fn name(&self) -> &'static str;

    /// Check if the engine's dependencies are installed.
    fn is_available(&self) -> bool;

    /// Describe what's needed to make this engine available.
    fn availability_hint(&self) -> String;

    /// Create a fresh, unconfigured session.
    async fn create(&self) -> Result<Box<dyn OcrSession>, OcrError>;
}

/// A single isolated unit of OCR work.
#[async_trait]
pub trait OcrSession: Send {
    /// Load the language profile and any engine options.
    async fn configure(&mut self, config: &OcrConfig) -> Result<(), OcrError>;

    /// Recognize text in an encoded image.
    async fn recognize(&mut self, image: &[u8]) -> Result<OcrResult, OcrError>;

    /// Release everything the session holds.
    async fn dispose(self: Box<Self>);
}
