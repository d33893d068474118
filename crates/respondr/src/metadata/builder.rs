use chrono::Utc;
use uuid::Uuid;

use super::record::{
    text_preview, DocumentRecord, FileMetadata, SourceLocation, DEFAULT_CLASSIFICATION,
    DEFAULT_ORG_ID, PDF_MIME_TYPE,
};
use crate::categorizer::Categorizer;
use crate::extractor;

/// Organization id taken from the first segment of an object key.
///
/// Keys without a `/` map to [`DEFAULT_ORG_ID`]. A key with an empty first
/// segment (`/fire.pdf`) also maps to [`DEFAULT_ORG_ID`] rather than to an
/// empty organization id, departing from a literal first-segment split.
/// Nothing beyond the first segment is interpreted.
pub fn organization_id_from_key(key: &str) -> String {
    match key.split_once('/') {
        Some((first, _)) if !first.is_empty() => first.to_string(),
        _ => DEFAULT_ORG_ID.to_string(),
    }
}

/// Assembles [`DocumentRecord`]s from extracted text and file facts.
#[derive(Default)]
pub struct MetadataBuilder {
    categorizer: Categorizer,
}

impl MetadataBuilder {
    pub fn new(categorizer: Categorizer) -> Self {
        Self { categorizer }
    }

    /// Builds a record with a fresh id and timestamp. Every inferred field
    /// falls back to absent or `unknown` on its own.
    pub fn build(
        &self,
        text: &str,
        page_count: u32,
        file: &FileMetadata,
        source: &SourceLocation,
    ) -> DocumentRecord {
        let categories = self.categorizer.categorize(text);

        DocumentRecord {
            document_id: Uuid::new_v4().to_string(),
            source: source.clone(),
            processed_at: Utc::now(),
            organization_id: organization_id_from_key(&source.key),
            version: extractor::extract_version(text),
            effective_date: extractor::extract_effective_date(text),
            author: extractor::extract_author(text),
            page_count,
            file_size_bytes: file.size_bytes,
            mime_type: PDF_MIME_TYPE.to_string(),
            checksum: file.checksum_sha256.clone(),
            ocr_coverage_pct: extractor::estimate_ocr_coverage(text, page_count),
            document_type: categories.document_type,
            roles_involved: categories.roles,
            hazard_types: categories.hazards,
            facility: extractor::extract_facility(text),
            jurisdiction: extractor::extract_jurisdiction(text),
            classification: DEFAULT_CLASSIFICATION.to_string(),
            pii_present: extractor::contains_pii(text),
            text_preview: text_preview(text),
        }
    }
}
