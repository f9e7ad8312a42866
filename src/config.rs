//! Configuration management for textgrab using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::camera::{CameraConfig, Facing};
use crate::ocr::{LanguageProfile, OcrConfig};

/// Default bind address for the web UI.
pub const DEFAULT_BIND: &str = "127.0.0.1:3030";

/// Default upload size limit (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

impl prefer::FromValue for Facing {
    fn from_value(value: &prefer::ConfigValue) -> prefer::Result<Self> {
        match value.as_str() {
            Some(s) => match s.to_lowercase().as_str() {
                "environment" | "rear" | "back" => Ok(Facing::Environment),
                "user" | "front" => Ok(Facing::User),
                other => Err(prefer::Error::ConversionError {
                    key: String::new(),
                    type_name: "Facing".to_string(),
                    source: format!("unknown camera facing: {}", other).into(),
                }),
            },
            None => Err(prefer::Error::ConversionError {
                key: String::new(),
                type_name: "Facing".to_string(),
                source: "expected string".into(),
            }),
        }
    }
}

/// `[ocr]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct OcrSection {
    /// Language profile, e.g. `eng+ara+fra`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<String>,
    /// Custom tessdata directory. Relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tessdata_dir: Option<String>,
}

impl OcrSection {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// `[camera]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct CameraSection {
    /// Capture device for the rear (environment) camera.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Capture device for the front (user) camera.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_device: Option<String>,
    /// ffmpeg input format (v4l2, avfoundation, dshow).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framerate: Option<u64>,
    /// How long to wait for the first frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[prefer(default)]
    pub facing: Option<Facing>,
}

impl CameraSection {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// `[upload]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct UploadSection {
    /// Largest accepted upload in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
    /// Reject inputs that are neither images nor PDFs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_unsupported: Option<bool>,
}

impl UploadSection {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Address the web UI listens on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "OcrSection::is_default")]
    #[prefer(default)]
    pub ocr: OcrSection,
    #[serde(default, skip_serializing_if = "CameraSection::is_default")]
    #[prefer(default)]
    pub camera: CameraSection,
    #[serde(default, skip_serializing_if = "UploadSection::is_default")]
    #[prefer(default)]
    pub upload: UploadSection,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers textgrab config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("textgrab").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, if loaded from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved against `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) -> Result<(), String> {
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }

        if let Some(ref languages) = self.ocr.languages {
            settings.languages = languages
                .parse()
                .map_err(|e| format!("Invalid ocr.languages: {}", e))?;
        }
        if let Some(ref dir) = self.ocr.tessdata_dir {
            settings.tessdata_dir = Some(self.resolve_path(dir, base_dir));
        }

        let camera = &self.camera;
        if let Some(ref device) = camera.device {
            settings.camera.environment_device = device.clone();
        }
        if camera.user_device.is_some() {
            settings.camera.user_device = camera.user_device.clone();
        }
        if let Some(ref format) = camera.input_format {
            settings.camera.input_format = format.clone();
        }
        if camera.video_size.is_some() {
            settings.camera.video_size = camera.video_size.clone();
        }
        if let Some(framerate) = camera.framerate {
            settings.camera.framerate = framerate;
        }
        if let Some(ms) = camera.ready_timeout_ms {
            settings.camera.ready_timeout = Duration::from_millis(ms);
        }
        if let Some(facing) = camera.facing {
            settings.facing = facing;
        }

        if let Some(max_bytes) = self.upload.max_bytes {
            settings.max_upload_bytes = usize::try_from(max_bytes)
                .map_err(|_| format!("upload.max_bytes too large: {}", max_bytes))?;
        }
        if let Some(reject) = self.upload.reject_unsupported {
            settings.reject_unsupported = reject;
        }

        Ok(())
    }

    /// Render as TOML for display.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// Effective runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the web UI listens on.
    pub bind: String,
    /// Languages recognized together.
    pub languages: LanguageProfile,
    pub tessdata_dir: Option<PathBuf>,
    pub camera: CameraConfig,
    /// Preferred camera facing.
    pub facing: Facing,
    pub max_upload_bytes: usize,
    pub reject_unsupported: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            languages: LanguageProfile::default(),
            tessdata_dir: None,
            camera: CameraConfig::default(),
            facing: Facing::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            reject_unsupported: false,
        }
    }
}

impl Settings {
    /// OCR configuration applied to every session.
    pub fn ocr_config(&self) -> OcrConfig {
        OcrConfig {
            languages: self.languages.clone(),
            tessdata_dir: self.tessdata_dir.clone(),
        }
    }

    /// Apply `TEXTGRAB_*` environment overrides.
    fn apply_env(&mut self) -> Result<(), String> {
        if let Some(languages) = env_var("TEXTGRAB_LANGUAGES") {
            tracing::debug!("Using TEXTGRAB_LANGUAGES from environment: {}", languages);
            self.languages = languages
                .parse()
                .map_err(|e| format!("Invalid TEXTGRAB_LANGUAGES: {}", e))?;
        }
        if let Some(device) = env_var("TEXTGRAB_CAMERA_DEVICE") {
            tracing::debug!("Using TEXTGRAB_CAMERA_DEVICE from environment: {}", device);
            self.camera.environment_device = device;
        }
        if let Some(bind) = env_var("TEXTGRAB_BIND") {
            tracing::debug!("Using TEXTGRAB_BIND from environment: {}", bind);
            self.bind = bind;
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> Result<(Settings, Config), String> {
    // An explicit --config must exist and parse; discovery falls back to defaults.
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir)?;
    settings.apply_env()?;

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_toml() {
        let file = write_config(
            ".toml",
            r#"
bind = "0.0.0.0:8080"

[ocr]
languages = "eng+deu"

[camera]
device = "/dev/video2"
framerate = 30
facing = "user"

[upload]
reject_unsupported = true
"#,
        );

        let config = Config::load_from_path(file.path()).await.unwrap();
        assert_eq!(config.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.camera.facing, Some(Facing::User));
        assert_eq!(config.source_path.as_deref(), Some(file.path()));

        let mut settings = Settings::default();
        config
            .apply_to_settings(&mut settings, Path::new("/etc"))
            .unwrap();
        assert_eq!(settings.bind, "0.0.0.0:8080");
        assert_eq!(settings.languages.to_string(), "eng+deu");
        assert_eq!(settings.camera.environment_device, "/dev/video2");
        assert_eq!(settings.camera.framerate, 30);
        assert_eq!(settings.facing, Facing::User);
        assert!(settings.reject_unsupported);
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let yaml = write_config(".yaml", "ocr:\n  languages: fra\ncamera:\n  ready_timeout_ms: 250\n");
        let config = Config::load_from_path(yaml.path()).await.unwrap();
        assert_eq!(config.ocr.languages.as_deref(), Some("fra"));
        assert_eq!(config.camera.ready_timeout_ms, Some(250));

        let json = write_config(".json", r#"{"upload": {"max_bytes": 1024}}"#);
        let config = Config::load_from_path(json.path()).await.unwrap();
        assert_eq!(config.upload.max_bytes, Some(1024));
    }

    #[tokio::test]
    async fn test_parse_error_is_reported() {
        let file = write_config(".toml", "bind = [");
        let err = Config::load_from_path(file.path()).await.unwrap_err();
        assert!(err.contains("Failed to parse TOML config"));
    }

    #[test]
    fn test_invalid_languages_rejected() {
        let config = Config {
            ocr: OcrSection {
                languages: Some("eng+../../etc".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut settings = Settings::default();
        assert!(config
            .apply_to_settings(&mut settings, Path::new("."))
            .is_err());
    }

    #[test]
    fn test_resolve_path() {
        let config = Config::default();
        let base = Path::new("/srv/textgrab");
        assert_eq!(
            config.resolve_path("tessdata", base),
            PathBuf::from("/srv/textgrab/tessdata")
        );
        assert_eq!(
            config.resolve_path("/usr/share/tessdata", base),
            PathBuf::from("/usr/share/tessdata")
        );
    }

    #[test]
    fn test_tessdata_relative_to_config() {
        let config = Config {
            ocr: OcrSection {
                tessdata_dir: Some("models".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut settings = Settings::default();
        config
            .apply_to_settings(&mut settings, Path::new("/opt/app"))
            .unwrap();
        assert_eq!(
            settings.ocr_config().tessdata_dir,
            Some(PathBuf::from("/opt/app/models"))
        );
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind, DEFAULT_BIND);
        assert_eq!(settings.languages.to_string(), "eng+ara+fra");
        assert!(!settings.reject_unsupported);
        assert!(Config::default().to_toml().trim().is_empty());
    }
}
