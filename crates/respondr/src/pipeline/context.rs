use crate::metadata::{DocumentRecord, FileMetadata};
use crate::ocr::ExtractedText;
use crate::worker::job::Job;

pub struct PipelineContext {
    // Input
    pub job: Job,

    // Step 1 result
    pub extracted: Option<ExtractedText>,

    // Step 2 result
    pub file: Option<FileMetadata>,

    // Step 3 result
    pub record: Option<DocumentRecord>,

    // Step 4 result: key of the text object in the parsed container
    pub text_key: Option<String>,
}

impl PipelineContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            extracted: None,
            file: None,
            record: None,
            text_key: None,
        }
    }
}
