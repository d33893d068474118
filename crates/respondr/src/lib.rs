pub mod categorizer;
pub mod config;
pub mod db;
pub mod error;
pub mod extractor;
pub mod fixtures;
pub mod logging;
pub mod metadata;
pub mod ocr;
pub mod pipeline;
pub mod report;
pub mod sanitize;
pub mod storage;
pub mod worker;

pub use categorizer::{CategorizationResult, Categorizer, DocumentType, Hazard, Role};
pub use config::{load_config, load_or_default, Config};
pub use db::{Database, MetadataStore};
pub use error::{ConfigError, OcrError, RespondrError, Result, StorageError, WorkerError};
pub use metadata::{DocumentRecord, FileMetadata, MetadataBuilder, SourceLocation};
pub use ocr::{OcrService, TextDetectionPoller};
pub use pipeline::{Pipeline, PipelineConfig, PipelineContext, PipelineError};
pub use report::{Dashboard, DocumentQuery, Statistics};
pub use storage::{FsObjectStore, ObjectStore};
pub use worker::{handle_event, HandlerResponse, Job, JobResult, StorageEvent, WorkerPool};
