//! System clipboard access.

use copypasta::{ClipboardContext, ClipboardProvider};
use thiserror::Error;

/// Errors from clipboard writes.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Clipboard write failed: {0}")]
    WriteFailed(String),
}

/// Destination for copied text.
pub trait Clipboard: Send + Sync {
    fn write(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard of the host running textgrab.
#[derive(Debug, Default, Clone)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        let mut ctx =
            ClipboardContext::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        ctx.set_contents(text.to_owned())
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
    }
}
