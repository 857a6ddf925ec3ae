//! Persistent configuration handling for Insight OCR.
//!
//! Persists configuration in a JSON file:
//! `~/.config/insight-ocr/config.json`.
//!
//! Every field is optional on disk; anything missing falls back to the built-in default.
//! Cleanup URL precedence: config, then `INSIGHT_OCR_CLEANUP_URL`, then the default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::reflow::ReflowConfig;
use crate::system::{CaptureRegion, TesseractConfig, DEFAULT_CLEANUP_URL};

const APP_CONFIG_DIR_NAME: &str = "insight-ocr";
const CONFIG_FILE_NAME: &str = "config.json";
pub const CLEANUP_URL_ENV: &str = "INSIGHT_OCR_CLEANUP_URL";
const DEFAULT_CLEANUP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No config directory available on this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ERROR" => Some(Self::Error),
            "WARN" | "WARNING" => Some(Self::Warn),
            "INFO" => Some(Self::Info),
            "DEBUG" => Some(Self::Debug),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ocr_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tesseract_binary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_cleanup_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cleanup_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cleanup_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capture_region: Option<CaptureRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reflow: Option<ReflowConfig>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_level: LogLevel,
    pub tesseract: TesseractConfig,
    pub text_cleanup_enabled: bool,
    pub cleanup_url: String,
    pub cleanup_timeout: Duration,
    pub capture_region: Option<CaptureRegion>,
    pub reflow: ReflowConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::resolve(RawConfig::default(), None)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Replaces out-of-range thresholds with their defaults.
fn sanitize_reflow(mut reflow: ReflowConfig) -> ReflowConfig {
    let defaults = ReflowConfig::default();
    if !(0.0..=1.0).contains(&reflow.min_confidence) {
        warn!(value = reflow.min_confidence, "min_confidence out of range, using default");
        reflow.min_confidence = defaults.min_confidence;
    }
    if !reflow.line_tolerance_px.is_finite() || reflow.line_tolerance_px <= 0.0 {
        warn!(value = reflow.line_tolerance_px, "line_tolerance_px must be positive, using default");
        reflow.line_tolerance_px = defaults.line_tolerance_px;
    }
    if reflow.max_sentences_per_paragraph == 0 {
        warn!("max_sentences_per_paragraph must be at least 1, using default");
        reflow.max_sentences_per_paragraph = defaults.max_sentences_per_paragraph;
    }
    reflow
}

impl AppConfig {
    fn resolve(raw: RawConfig, env_cleanup_url: Option<String>) -> Self {
        let tesseract_defaults = TesseractConfig::default();
        Self {
            log_level: raw
                .log_level
                .as_deref()
                .and_then(LogLevel::from_str)
                .unwrap_or_default(),
            tesseract: TesseractConfig {
                binary: non_empty(raw.tesseract_binary).unwrap_or(tesseract_defaults.binary),
                language: non_empty(raw.ocr_language).unwrap_or(tesseract_defaults.language),
            },
            text_cleanup_enabled: raw.text_cleanup_enabled.unwrap_or(false),
            cleanup_url: non_empty(raw.cleanup_url)
                .or_else(|| non_empty(env_cleanup_url))
                .unwrap_or_else(|| DEFAULT_CLEANUP_URL.to_string()),
            cleanup_timeout: Duration::from_secs(
                raw.cleanup_timeout_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_CLEANUP_TIMEOUT_SECS),
            ),
            capture_region: raw.capture_region.filter(|r| r.width > 0 && r.height > 0),
            reflow: sanitize_reflow(raw.reflow.unwrap_or_default()),
        }
    }

    fn to_raw(&self) -> RawConfig {
        RawConfig {
            log_level: Some(self.log_level.as_str().to_string()),
            ocr_language: non_empty(Some(self.tesseract.language.clone())),
            tesseract_binary: non_empty(Some(self.tesseract.binary.clone())),
            text_cleanup_enabled: Some(self.text_cleanup_enabled),
            cleanup_url: non_empty(Some(self.cleanup_url.clone())),
            cleanup_timeout_secs: Some(self.cleanup_timeout.as_secs()),
            capture_region: self.capture_region,
            reflow: Some(self.reflow),
        }
    }

    /// Pretty JSON in the on-disk format.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.to_raw())?)
    }
}

pub fn config_path() -> Option<PathBuf> {
    let path = config_dir()?
        .join(APP_CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME);
    Some(path)
}

fn ensure_config_dir_exists(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn load_raw_config(path: &Path) -> Result<RawConfig, ConfigError> {
    if !path.exists() {
        debug!(?path, "Config file does not exist, using defaults");
        return Ok(RawConfig::default());
    }
    let data = fs::read_to_string(path)?;
    let cfg = serde_json::from_str(&data)?;
    debug!(?path, "Config loaded");
    Ok(cfg)
}

/// Loads and resolves the config at `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = load_raw_config(path)?;
    Ok(AppConfig::resolve(raw, std::env::var(CLEANUP_URL_ENV).ok()))
}

/// Loads the config from the default location, falling back to defaults on any error.
pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        debug!("No config_dir available, using defaults only");
        return AppConfig::resolve(RawConfig::default(), std::env::var(CLEANUP_URL_ENV).ok());
    };
    match load_config_from(&path) {
        Ok(cfg) => cfg,
        Err(err) => {
            warn!(error = ?err, "Failed to load config, using defaults");
            AppConfig::resolve(RawConfig::default(), std::env::var(CLEANUP_URL_ENV).ok())
        }
    }
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    ensure_config_dir_exists(path)?;
    fs::write(path, config.to_json()?)?;
    debug!(?path, "Config saved");
    Ok(())
}

pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_config_to(&path, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_json(json: &str, env: Option<&str>) -> AppConfig {
        let raw: RawConfig = serde_json::from_str(json).unwrap();
        AppConfig::resolve(raw, env.map(str::to_string))
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("Debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("loud"), None);
        assert_eq!(LogLevel::Trace.as_filter(), "trace");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = resolve_json("{}", None);
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert_eq!(cfg.tesseract, TesseractConfig::default());
        assert!(!cfg.text_cleanup_enabled);
        assert_eq!(cfg.cleanup_url, DEFAULT_CLEANUP_URL);
        assert_eq!(cfg.cleanup_timeout, Duration::from_secs(30));
        assert_eq!(cfg.capture_region, None);
        assert_eq!(cfg.reflow, ReflowConfig::default());
    }

    #[test]
    fn test_cleanup_url_precedence() {
        let from_file = resolve_json(r#"{"cleanup_url":"http://file:1"}"#, Some("http://env:2"));
        assert_eq!(from_file.cleanup_url, "http://file:1");
        let from_env = resolve_json(r#"{"cleanup_url":"  "}"#, Some("http://env:2"));
        assert_eq!(from_env.cleanup_url, "http://env:2");
    }

    #[test]
    fn test_partial_reflow_block() {
        let cfg = resolve_json(r#"{"reflow":{"line_tolerance_px":14.5}}"#, None);
        assert_eq!(cfg.reflow.line_tolerance_px, 14.5);
        assert_eq!(cfg.reflow.min_confidence, 0.6);
        assert_eq!(cfg.reflow.short_sentence_chars, 30);
    }

    #[test]
    fn test_invalid_thresholds_fall_back() {
        let cfg = resolve_json(
            r#"{"reflow":{"min_confidence":3.0,"line_tolerance_px":-1,"max_sentences_per_paragraph":0}}"#,
            None,
        );
        assert_eq!(cfg.reflow, ReflowConfig::default());
    }

    #[test]
    fn test_zero_sized_region_ignored() {
        let cfg = resolve_json(
            r#"{"capture_region":{"x":0,"y":0,"width":0,"height":10}}"#,
            None,
        );
        assert_eq!(cfg.capture_region, None);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let cfg = AppConfig {
            log_level: LogLevel::Debug,
            text_cleanup_enabled: true,
            cleanup_url: "http://cleanup.local:9000".into(),
            capture_region: Some(CaptureRegion {
                x: 10,
                y: 20,
                width: 640,
                height: 480,
            }),
            ..AppConfig::default()
        };
        save_config_to(&path, &cfg).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Info);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Json(_))));
    }
}
