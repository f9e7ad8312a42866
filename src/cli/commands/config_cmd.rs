//! Configuration display command.

use console::style;

use crate::cli::icons::dim_arrow;
use crate::config::{Config, Settings};

/// Print where config came from and the effective settings.
pub fn cmd_config_show(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => println!("{} Config file: {}", dim_arrow(), path.display()),
        None => println!("{} No config file found, using defaults", dim_arrow()),
    }

    let file_contents = config.to_toml();
    if !file_contents.trim().is_empty() {
        println!("\n{}", style("File settings:").cyan());
        println!("{}", file_contents.trim_end());
    }

    println!("\n{}", style("Effective settings:").cyan());
    println!("  {:<20} {}", "bind", settings.bind);
    println!("  {:<20} {}", "ocr.languages", settings.languages);
    println!(
        "  {:<20} {}",
        "ocr.tessdata_dir",
        settings
            .tessdata_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(system)".to_string())
    );
    println!(
        "  {:<20} {} ({})",
        "camera.device",
        settings.camera.device_for(settings.facing),
        settings.camera.input_format
    );
    println!("  {:<20} {}", "camera.framerate", settings.camera.framerate);
    println!(
        "  {:<20} {}ms",
        "camera.ready_timeout",
        settings.camera.ready_timeout.as_millis()
    );
    println!("  {:<20} {}", "upload.max_bytes", settings.max_upload_bytes);
    println!(
        "  {:<20} {}",
        "upload.reject_unsupported", settings.reject_unsupported
    );

    Ok(())
}
