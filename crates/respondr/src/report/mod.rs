//! Read surface over stored records and text objects.
//!
//! Every operation here degrades instead of failing: a store error yields
//! an empty result together with the error message.

pub mod stats;

pub use stats::{format_bytes, ranked, Statistics};

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::categorizer::DocumentType;
use crate::db::{DatabaseError, MetadataStore};
use crate::metadata::DocumentRecord;
use crate::storage::ObjectStore;

/// Listing filter. An empty organization counts as no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    pub organization_id: Option<String>,
    pub document_type: Option<DocumentType>,
}

impl DocumentQuery {
    pub fn new(organization_id: Option<String>, document_type: Option<DocumentType>) -> Self {
        Self {
            organization_id: organization_id.filter(|o| !o.is_empty()),
            document_type,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentListing {
    /// Newest first.
    pub documents: Vec<DocumentRecord>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextRetrieval {
    pub text: String,
    pub error: Option<String>,
}

pub struct Dashboard {
    metadata: Arc<dyn MetadataStore>,
    store: Arc<dyn ObjectStore>,
    parsed_container: String,
}

impl Dashboard {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        store: Arc<dyn ObjectStore>,
        parsed_container: impl Into<String>,
    ) -> Self {
        Self {
            metadata,
            store,
            parsed_container: parsed_container.into(),
        }
    }

    /// Organization and type use the org/type index; organization alone
    /// filters a scan; otherwise every record is scanned. A type without an
    /// organization is applied to the full scan.
    pub fn fetch(&self, query: &DocumentQuery) -> DocumentListing {
        let result: Result<Vec<DocumentRecord>, DatabaseError> =
            match (&query.organization_id, query.document_type) {
                (Some(org), Some(doctype)) => self.metadata.query_by_org_doctype(org, doctype),
                (Some(org), None) => self.metadata.scan_by_org(org),
                (None, doctype) => self.metadata.scan_all().map(|records| {
                    records
                        .into_iter()
                        .filter(|r| doctype.map_or(true, |t| r.document_type == t))
                        .collect()
                }),
            };

        match result {
            Ok(mut documents) => {
                documents.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
                DocumentListing {
                    documents,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Error fetching documents");
                DocumentListing {
                    documents: Vec::new(),
                    error: Some(format!("Error fetching documents: {}", e)),
                }
            }
        }
    }

    pub fn statistics(&self, query: &DocumentQuery) -> (Statistics, DocumentListing) {
        let listing = self.fetch(query);
        (Statistics::from_records(&listing.documents), listing)
    }

    /// Stored full text of a document, looked up through its record.
    pub fn full_text(&self, document_id: &str) -> TextRetrieval {
        match self.read_text(document_id) {
            Ok(text) => TextRetrieval { text, error: None },
            Err(message) => {
                warn!(%document_id, error = %message, "Error downloading text");
                TextRetrieval {
                    text: String::new(),
                    error: Some(message),
                }
            }
        }
    }

    fn read_text(&self, document_id: &str) -> Result<String, String> {
        let record = self
            .metadata
            .find_record(document_id)
            .map_err(|e| format!("Error downloading text: {}", e))?
            .ok_or_else(|| format!("Unknown document: {}", document_id))?;
        let bytes = self
            .store
            .get(&self.parsed_container, &record.text_key())
            .map_err(|e| format!("Error downloading text: {}", e))?;
        String::from_utf8(bytes).map_err(|e| format!("Stored text is not UTF-8: {}", e))
    }
}
