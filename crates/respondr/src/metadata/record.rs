use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::categorizer::{DocumentType, Hazard, Role};

/// MIME type recorded for every ingested document.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Classification label recorded for every ingested document.
pub const DEFAULT_CLASSIFICATION: &str = "internal";

/// Organization id used when a key has no leading path segment.
pub const DEFAULT_ORG_ID: &str = "default_org";

/// Number of characters of extracted text kept on the record.
pub const TEXT_PREVIEW_CHARS: usize = 500;

const TEXT_EXTENSION: &str = "txt";

/// Origin of an artifact: a container (bucket) and an object key within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub container: String,
    pub key: String,
}

impl SourceLocation {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }

    /// Last path segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// True for keys ending in `.pdf`, ignoring case.
    pub fn is_pdf(&self) -> bool {
        self.key.to_ascii_lowercase().ends_with(".pdf")
    }

    /// Key of the extracted-text object for `document_id`:
    /// `{document_id}/{file stem}.txt`.
    pub fn text_key(&self, document_id: &str) -> String {
        format!("{}/{}", document_id, text_file_name(self.file_name()))
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

fn text_file_name(file_name: &str) -> String {
    let stem = if file_name.to_ascii_lowercase().ends_with(".pdf") {
        &file_name[..file_name.len() - 4]
    } else {
        file_name
    };
    format!("{stem}.{TEXT_EXTENSION}")
}

/// File-level facts read from object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub size_bytes: u64,
    pub checksum_sha256: String,
}

/// Metadata inferred for one ingested document. Built once, never updated;
/// reprocessing produces a new record with a new id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document_id: String,
    pub source: SourceLocation,
    pub processed_at: DateTime<Utc>,
    pub organization_id: String,
    pub version: Option<String>,
    pub effective_date: Option<String>,
    pub author: Option<String>,
    pub page_count: u32,
    pub file_size_bytes: u64,
    pub mime_type: String,
    pub checksum: String,
    pub ocr_coverage_pct: f64,
    pub document_type: DocumentType,
    pub roles_involved: Vec<Role>,
    pub hazard_types: Vec<Hazard>,
    pub facility: Option<String>,
    pub jurisdiction: Option<String>,
    pub classification: String,
    pub pii_present: bool,
    pub text_preview: String,
}

impl DocumentRecord {
    /// Key of this record's extracted-text object.
    pub fn text_key(&self) -> String {
        self.source.text_key(&self.document_id)
    }
}

/// First `TEXT_PREVIEW_CHARS` characters of `text`.
pub fn text_preview(text: &str) -> String {
    text.chars().take(TEXT_PREVIEW_CHARS).collect()
}
