use thiserror::Error;

/// Fatal causes for one document's processing. No record is written once
/// any of these occurs before the persist step.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Text extraction failed: {0}")]
    Ocr(#[from] crate::error::OcrError),

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Metadata store failed: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Pipeline incomplete: {0}")]
    Incomplete(String),
}
