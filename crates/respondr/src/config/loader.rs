use std::path::{Path, PathBuf};

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;

pub const ENV_STORAGE_ROOT: &str = "RESPONDR_STORAGE_ROOT";
pub const ENV_DATABASE_PATH: &str = "RESPONDR_DATABASE_PATH";
pub const ENV_PARSED_CONTAINER: &str = "RESPONDR_PARSED_CONTAINER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// `.yaml` and `.yml` are YAML; anything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

/// `~/.respondr/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".respondr").join("config.yaml"))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content, ConfigFormat::from_path(path))
}

/// Parses, applies environment overrides, validates.
pub fn load_config_from_str(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let mut config: Config = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Loads `path` when given, else the default config file when it exists,
/// else built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return load_config(path);
    }

    if let Some(default_path) = default_config_path().filter(|p| p.is_file()) {
        log::info!("Loading config from {}", default_path.display());
        return load_config(default_path);
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    let overrides = [
        (ENV_STORAGE_ROOT, &mut config.storage_root),
        (ENV_DATABASE_PATH, &mut config.database_path),
        (ENV_PARSED_CONTAINER, &mut config.parsed_container),
    ];
    for (name, field) in overrides {
        if let Ok(value) = std::env::var(name) {
            if !value.is_empty() {
                log::debug!("{} overrides config file value", name);
                *field = value;
            }
        }
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.storage_root.is_empty() {
        return Err(ConfigError::NoDefaultPath("storage_root"));
    }
    if config.database_path.is_empty() {
        return Err(ConfigError::NoDefaultPath("database_path"));
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be greater than 0".to_string(),
        });
    }
    if config.ocr.max_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "ocr.max_attempts must be greater than 0".to_string(),
        });
    }
    if config.ocr.poll_interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "ocr.poll_interval_secs must be greater than 0".to_string(),
        });
    }

    let container = &config.parsed_container;
    if container.is_empty() || container.contains('/') || container.contains('\\') {
        return Err(ConfigError::Validation {
            message: format!("Invalid parsed_container name: '{}'", container),
        });
    }

    Ok(())
}
