use serde::Serialize;

use crate::categorizer::DocumentType;
use crate::metadata::{DocumentRecord, SourceLocation};

/// One uploaded object awaiting processing.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub source: SourceLocation,
}

impl Job {
    pub fn new(source: SourceLocation) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_id: String,
    pub source: SourceLocation,
    pub success: bool,
    pub document_id: Option<String>,
    pub document_type: Option<DocumentType>,
    /// Key of the stored text object in the parsed container.
    pub text_key: Option<String>,
    pub error: Option<String>,
}

impl JobResult {
    pub fn success(job: &Job, record: &DocumentRecord, text_key: String) -> Self {
        Self {
            job_id: job.id.clone(),
            source: job.source.clone(),
            success: true,
            document_id: Some(record.document_id.clone()),
            document_type: Some(record.document_type),
            text_key: Some(text_key),
            error: None,
        }
    }

    pub fn failure(job: &Job, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            source: job.source.clone(),
            success: false,
            document_id: None,
            document_type: None,
            text_key: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FileMetadata, MetadataBuilder};

    #[test]
    fn test_job_new() {
        let job = Job::new(SourceLocation::new("uploads", "acme/plan.pdf"));
        assert!(!job.id.is_empty());
        assert_eq!(job.source.key, "acme/plan.pdf");
    }

    #[test]
    fn test_job_ids_are_unique() {
        let source = SourceLocation::new("uploads", "acme/plan.pdf");
        let a = Job::new(source.clone());
        let b = Job::new(source);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_job_result_success() {
        let source = SourceLocation::new("uploads", "acme/plan.pdf");
        let job = Job::new(source.clone());
        let file = FileMetadata {
            size_bytes: 10,
            checksum_sha256: "00".to_string(),
        };
        let record = MetadataBuilder::default().build("Evacuation procedures", 1, &file, &source);
        let result = JobResult::success(&job, &record, record.text_key());

        assert!(result.success);
        assert_eq!(result.job_id, job.id);
        assert_eq!(result.document_id.as_deref(), Some(record.document_id.as_str()));
        assert_eq!(result.document_type, Some(DocumentType::EmergencyPlan));
        assert_eq!(
            result.text_key,
            Some(format!("{}/plan.txt", record.document_id))
        );
        assert!(result.error.is_none());
    }

    #[test]
    fn test_job_result_failure() {
        let job = Job::new(SourceLocation::new("uploads", "acme/plan.pdf"));
        let result = JobResult::failure(&job, "Test error".to_string());

        assert!(!result.success);
        assert!(result.document_id.is_none());
        assert!(result.text_key.is_none());
        assert_eq!(result.error, Some("Test error".to_string()));
    }
}
