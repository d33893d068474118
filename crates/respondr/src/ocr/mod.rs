//! Text detection collaborator and result assembly.
//!
//! An [`OcrService`] runs asynchronous text detection jobs: a job is
//! submitted for a stored object, its status is polled, and once it has
//! succeeded the detected blocks are fetched page by page using a
//! continuation token. [`TextDetectionPoller`] drives that exchange.

mod local;
mod poller;
#[cfg(feature = "tesseract")]
mod tesseract;

pub use local::{LocalOcrService, BLOCKS_PER_RESULT_PAGE};
pub use poller::{PollSettings, PollState, Sleeper, TextDetectionPoller, ThreadSleeper};
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::metadata::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InProgress,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Page,
    Line,
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_type: BlockType,
    pub text: Option<String>,
}

impl Block {
    pub fn page() -> Self {
        Self {
            block_type: BlockType::Page,
            text: None,
        }
    }

    pub fn line(text: impl Into<String>) -> Self {
        Self {
            block_type: BlockType::Line,
            text: Some(text.into()),
        }
    }
}

/// One response of a status/result request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDetectionPage {
    pub status: JobStatus,
    pub status_message: Option<String>,
    pub blocks: Vec<Block>,
    pub next_token: Option<String>,
}

impl TextDetectionPage {
    pub fn in_progress() -> Self {
        Self {
            status: JobStatus::InProgress,
            status_message: None,
            blocks: Vec::new(),
            next_token: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            status_message: Some(message.into()),
            blocks: Vec::new(),
            next_token: None,
        }
    }

    pub fn succeeded(blocks: Vec<Block>, next_token: Option<String>) -> Self {
        Self {
            status: JobStatus::Succeeded,
            status_message: None,
            blocks,
            next_token,
        }
    }
}

/// Text detection backend.
pub trait OcrService: Send + Sync {
    /// Submits a job for the object at `source` and returns its id.
    fn start_text_detection(&self, source: &SourceLocation) -> Result<String, OcrError>;

    /// Returns the job status and, once succeeded, one page of results.
    fn get_text_detection(
        &self,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<TextDetectionPage, OcrError>;
}

/// Text and page count assembled from a finished job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: u32,
}

/// Accumulates result pages: `LINE` blocks contribute text, `PAGE` blocks
/// count pages, anything else is ignored.
#[derive(Debug, Default)]
pub struct TextAssembler {
    lines: Vec<String>,
    page_count: u32,
}

impl TextAssembler {
    pub fn push_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            match block.block_type {
                BlockType::Line => {
                    if let Some(text) = &block.text {
                        self.lines.push(text.clone());
                    }
                }
                BlockType::Page => self.page_count += 1,
                BlockType::Word => {}
            }
        }
    }

    pub fn finish(self) -> ExtractedText {
        ExtractedText {
            text: self.lines.join("\n"),
            page_count: self.page_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembler_joins_lines_and_counts_pages() {
        let mut assembler = TextAssembler::default();
        assembler.push_blocks(&[
            Block::page(),
            Block::line("Fire Evacuation Plan"),
            Block {
                block_type: BlockType::Word,
                text: Some("Fire".into()),
            },
            Block::line("Version 1.0"),
        ]);
        assembler.push_blocks(&[Block::page(), Block::line("Page two")]);

        let extracted = assembler.finish();
        assert_eq!(extracted.text, "Fire Evacuation Plan\nVersion 1.0\nPage two");
        assert_eq!(extracted.page_count, 2);
    }

    #[test]
    fn test_empty_assembly() {
        let extracted = TextAssembler::default().finish();
        assert_eq!(extracted, ExtractedText::default());
    }

    #[test]
    fn test_status_serializes_in_upper_case() {
        let json = serde_json::to_string(&JobStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
