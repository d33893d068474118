use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RespondrError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Could not determine a default location for '{0}' (no home directory)")]
    NoDefaultPath(&'static str),
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to start text detection for '{source_key}': {reason}")]
    StartFailed { source_key: String, reason: String },

    #[error("Text detection job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Text detection job {job_id} timed out after {attempts} status checks")]
    Timeout { job_id: String, attempts: u32 },

    #[error("Unknown text detection job: {0}")]
    UnknownJob(String),

    #[error("Invalid continuation token '{0}'")]
    InvalidToken(String),

    #[error("Text detection service error: {0}")]
    Service(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write object '{path}': {source}")]
    WriteObject {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read object '{path}': {source}")]
    ReadObject {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object not found: {container}/{key}")]
    NotFound { container: String, key: String },

    #[error("Invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Failed to list container '{container}': {source}")]
    List {
        container: String,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Failed to parse storage event: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RespondrError>;
