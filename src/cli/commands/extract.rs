//! One-shot extraction commands.

use std::path::Path;

use crate::cli::helpers::{maybe_copy, print_result, spinner};
use crate::cli::icons::success;
use crate::config::Settings;
use crate::controller::{ExtractionController, UploadedFile};

/// Override the configured OCR languages with `--lang`.
pub fn apply_lang(settings: &mut Settings, lang: Option<&str>) -> anyhow::Result<()> {
    if let Some(lang) = lang {
        settings.languages = lang
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid --lang: {}", e))?;
    }
    Ok(())
}

/// Extract text from a file on disk.
pub async fn cmd_extract(settings: &Settings, file: &Path, copy: bool) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let upload = UploadedFile::from_path(file).await?;
    let controller = ExtractionController::from_settings(settings);

    let pb = spinner(&format!("Extracting text from {}...", file.display()));
    let result = controller.submit_file(upload).await;
    pb.finish_and_clear();

    print_result(&result?)?;
    maybe_copy(&controller, copy).await
}

/// Open the camera, capture a frame and extract its text.
pub async fn cmd_capture(settings: &Settings, copy: bool) -> anyhow::Result<()> {
    let controller = ExtractionController::from_settings(settings);

    let pb = spinner(&format!(
        "Opening camera {}...",
        settings.camera.device_for(settings.facing)
    ));
    if let Err(e) = controller.open_camera().await {
        pb.finish_and_clear();
        return Err(e.into());
    }
    pb.finish_and_clear();
    eprintln!("{} Camera ready", success());

    let pb = spinner("Extracting text from captured frame...");
    let result = controller.capture_frame().await;
    pb.finish_and_clear();

    // capture_frame already released the camera; this covers early exits.
    controller.shutdown().await;

    print_result(&result?)?;
    maybe_copy(&controller, copy).await
}
