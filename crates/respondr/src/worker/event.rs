//! Storage notification documents.
//!
//! An upload notification carries one or more records, each naming the
//! container and key of a newly written object:
//!
//! ```json
//! {"Records":[{"s3":{"bucket":{"name":"uploads"},"object":{"key":"acme/plan.pdf"}}}]}
//! ```
//!
//! Keys are taken verbatim; no URL decoding is applied.

use serde::{Deserialize, Serialize};

use crate::error::WorkerError;
use crate::metadata::SourceLocation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records")]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub s3: ObjectEntity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub key: String,
}

impl StorageEvent {
    pub fn from_json(input: &str) -> Result<Self, WorkerError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Builds a single-record event, as emitted for one upload.
    pub fn for_object(source: &SourceLocation) -> Self {
        Self {
            records: vec![EventRecord {
                s3: ObjectEntity {
                    bucket: BucketRef {
                        name: source.container.clone(),
                    },
                    object: ObjectRef {
                        key: source.key.clone(),
                    },
                },
            }],
        }
    }

    /// Source locations in record order.
    pub fn sources(&self) -> Vec<SourceLocation> {
        self.records
            .iter()
            .map(|r| SourceLocation::new(&r.s3.bucket.name, &r.s3.object.key))
            .collect()
    }
}
