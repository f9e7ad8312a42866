//! Shared helper functions for CLI commands.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::icons::{error, success, warn};
use crate::controller::{ExtractionController, ExtractionResult};

/// Spinner shown while an extraction or camera warm-up runs.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print a result to stdout, with a status line on stderr.
///
/// Returns an error for failed extractions so the process exits non-zero.
pub fn print_result(result: &ExtractionResult) -> anyhow::Result<()> {
    if let Some(ref message) = result.error {
        eprintln!("{} {}", error(), result.text);
        anyhow::bail!("extraction failed: {}", message);
    }

    match result.page_count {
        Some(pages) => eprintln!(
            "{} Extracted text from {} page{}",
            success(),
            pages,
            if pages == 1 { "" } else { "s" }
        ),
        None => eprintln!("{} Extracted text", success()),
    }
    println!("{}", result.text.trim_end());
    Ok(())
}

/// Copy the controller's current text if requested.
pub async fn maybe_copy(controller: &ExtractionController, copy: bool) -> anyhow::Result<()> {
    if !copy {
        return Ok(());
    }
    if controller.copy_to_clipboard().await? {
        eprintln!("{} Copied to clipboard", style("→").dim());
    } else {
        eprintln!("{} Nothing to copy", warn());
    }
    Ok(())
}
