//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod config_cmd;
mod extract;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::camera::Facing;
use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "textgrab")]
#[command(about = "Extract text from images, PDFs and camera captures")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Camera facing as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum FacingArg {
    /// Rear camera
    Environment,
    /// Front camera
    User,
}

impl From<FacingArg> for Facing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Environment => Facing::Environment,
            FacingArg::User => Facing::User,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI
    Serve {
        /// Address to bind: PORT, HOST, or HOST:PORT [default: from config or 127.0.0.1:3030]
        bind: Option<String>,
    },

    /// Extract text from an image or PDF file
    Extract {
        /// File to read
        file: PathBuf,
        /// Copy the extracted text to the clipboard
        #[arg(long)]
        copy: bool,
        /// OCR languages, e.g. eng+fra (overrides config)
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Capture a frame from the camera and extract its text
    Capture {
        /// Copy the extracted text to the clipboard
        #[arg(long)]
        copy: bool,
        /// Which camera to use
        #[arg(long, value_enum)]
        facing: Option<FacingArg>,
        /// OCR languages, e.g. eng+fra (overrides config)
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Check that the external tools are installed
    Check,

    /// Show the effective configuration
    Config,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (mut settings, config) = load_settings_with_options(options)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::Extract { file, copy, lang } => {
            extract::apply_lang(&mut settings, lang.as_deref())?;
            extract::cmd_extract(&settings, &file, copy).await
        }
        Commands::Capture { copy, facing, lang } => {
            extract::apply_lang(&mut settings, lang.as_deref())?;
            if let Some(facing) = facing {
                settings.facing = facing.into();
            }
            extract::cmd_capture(&settings, copy).await
        }
        Commands::Check => check::cmd_check(&settings).await,
        Commands::Config => config_cmd::cmd_config_show(&settings, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from(["textgrab", "extract", "scan.png", "--copy", "-l", "eng"])
            .unwrap();
        match cli.command {
            Commands::Extract { file, copy, lang } => {
                assert_eq!(file, PathBuf::from("scan.png"));
                assert!(copy);
                assert_eq!(lang.as_deref(), Some("eng"));
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_parse_capture_facing() {
        let cli = Cli::try_parse_from(["textgrab", "-v", "capture", "--facing", "user"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Capture { facing, .. } => assert_eq!(facing, Some(FacingArg::User)),
            _ => panic!("expected capture"),
        }
    }
}
