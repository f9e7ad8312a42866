//! Tool status command.

use console::style;

use crate::cli::icons::{dim_arrow, error};
use crate::config::Settings;
use crate::ocr::{OcrEngine, TesseractEngine};
use crate::tools::{check_tools, FFMPEG_NOT_FOUND, POPPLER_NOT_FOUND, TESSERACT_NOT_FOUND};

/// Print which external tools and OCR languages are available.
pub async fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tool Status").bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("Tools:").cyan());
    let tools = check_tools();
    let mut all_found = true;
    for tool in &tools {
        let status = if tool.available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<12} {:<16} {}", tool.name, style(tool.purpose).dim(), status);
    }

    println!("\n{}", style("OCR Languages:").cyan());
    let tesseract = TesseractEngine::new();
    if tesseract.is_available() {
        let installed = TesseractEngine::installed_languages()
            .await
            .unwrap_or_default();
        for lang in settings.languages.languages() {
            let status = if installed.iter().any(|l| l == lang) {
                style("✓ installed").green()
            } else {
                all_found = false;
                style("✗ missing").red()
            };
            println!("  {:<12} {}", lang, status);
        }
    } else {
        println!("  {} {}", error(), style(tesseract.availability_hint()).dim());
    }

    println!();
    if all_found {
        println!("{}", style("All tools found!").green());
    } else {
        println!("{}", style("Some tools are missing:").yellow());
        let missing = |name: &str| tools.iter().any(|t| t.name == name && !t.available);
        if missing("tesseract") {
            println!("  {} {}", dim_arrow(), TESSERACT_NOT_FOUND);
        }
        if missing("pdfinfo") || missing("pdftotext") {
            println!("  {} {}", dim_arrow(), POPPLER_NOT_FOUND);
        }
        if missing("ffmpeg") {
            println!("  {} {}", dim_arrow(), FFMPEG_NOT_FOUND);
        }
    }

    Ok(())
}
