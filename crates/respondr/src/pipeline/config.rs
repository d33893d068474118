use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::ocr::PollSettings;

pub struct PipelineConfig {
    pub storage_root: PathBuf,
    pub database_path: PathBuf,
    pub parsed_container: String,
    pub poll: PollSettings,
    pub tesseract_enabled: bool,
    pub tesseract_languages: Vec<String>,
    pub tesseract_dpi: u32,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            storage_root: PathBuf::from(&config.storage_root),
            database_path: PathBuf::from(&config.database_path),
            parsed_container: config.parsed_container.clone(),
            poll: PollSettings {
                interval: Duration::from_secs(config.ocr.poll_interval_secs),
                max_attempts: config.ocr.max_attempts,
            },
            tesseract_enabled: config.ocr.tesseract.enabled,
            tesseract_languages: config.ocr.tesseract.languages.clone(),
            tesseract_dpi: config.ocr.tesseract.dpi,
        }
    }
}
