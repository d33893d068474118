use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;

pub const CONFIG_VERSION: &str = "1.0";
pub const DEFAULT_PARSED_CONTAINER: &str = "respondr-docs-parsed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Directory holding one subdirectory per container.
    #[serde(default = "default_storage_root")]
    pub storage_root: String,
    /// Container receiving extracted text objects.
    #[serde(default = "default_parsed_container")]
    pub parsed_container: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            storage_root: default_storage_root(),
            parsed_container: default_parsed_container(),
            database_path: default_database_path(),
            worker_count: default_worker_count(),
            ocr: OcrConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

fn respondr_home() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|h| h.join(".respondr"))
}

/// Empty when no home directory is known; the loader rejects that.
fn default_storage_root() -> String {
    respondr_home()
        .map(|p| p.join("storage").to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn default_database_path() -> String {
    crate::db::default_database_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn default_parsed_container() -> String {
    DEFAULT_PARSED_CONTAINER.to_string()
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Seconds between status checks of a running text detection job.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Status checks before a job is reported as timed out.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub tesseract: TesseractConfig,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    60
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_attempts: default_max_attempts(),
            tesseract: TesseractConfig::default(),
        }
    }
}

/// Fallback recognition for pages without a usable text layer. Only
/// honoured by builds with the `tesseract` feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TesseractConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_dpi() -> u32 {
    300
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            languages: default_languages(),
            dpi: default_dpi(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = serde_json::from_str(r#"{"version": "1.0"}"#).unwrap();
        assert_eq!(config.parsed_container, "respondr-docs-parsed");
        assert_eq!(config.ocr.poll_interval_secs, 5);
        assert_eq!(config.ocr.max_attempts, 60);
        assert!(!config.ocr.tesseract.enabled);
        assert_eq!(config.ocr.tesseract.languages, vec!["eng"]);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.worker_count > 0);
    }

    #[test]
    fn test_default_matches_minimal_document() {
        let parsed: Config = serde_json::from_str(r#"{"version": "1.0"}"#).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_log_format_lowercase() {
        let config: Config =
            serde_json::from_str(r#"{"version": "1.0", "log_format": "json"}"#).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_nested_ocr_overrides() {
        let config: Config = serde_json::from_str(
            r#"{"version": "1.0", "ocr": {"max_attempts": 3, "tesseract": {"enabled": true, "dpi": 150}}}"#,
        )
        .unwrap();
        assert_eq!(config.ocr.max_attempts, 3);
        assert_eq!(config.ocr.poll_interval_secs, 5);
        assert!(config.ocr.tesseract.enabled);
        assert_eq!(config.ocr.tesseract.dpi, 150);
        assert_eq!(config.ocr.tesseract.languages, vec!["eng"]);
    }
}
