//! Isolated environment for running the pipeline end to end.
//!
//! A `TestHarness` owns a temporary storage root, an in-memory database and
//! a `Pipeline` wired to either the local OCR service or a scripted one.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use respondr::db::Database;
use respondr::error::OcrError;
use respondr::fixtures::SampleDocument;
use respondr::metadata::SourceLocation;
use respondr::ocr::{
    Block, LocalOcrService, OcrService, PollSettings, Sleeper, TextDetectionPage, ThreadSleeper,
};
use respondr::pipeline::{Pipeline, PipelineConfig};
use respondr::report::Dashboard;
use respondr::storage::{FsObjectStore, ObjectStore};

pub const UPLOADS: &str = "uploads";
pub const PARSED: &str = "parsed";

pub struct TestHarness {
    temp_dir: TempDir,
    pub store: Arc<FsObjectStore>,
    pub db: Database,
    pub pipeline: Arc<Pipeline>,
}

impl TestHarness {
    /// Local OCR service with a short real poll interval.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(FsObjectStore::new(temp_dir.path()));
        let ocr = Arc::new(LocalOcrService::new(store.clone()));
        let settings = PollSettings {
            interval: Duration::from_millis(5),
            max_attempts: 2_000,
        };
        Self::assemble(temp_dir, store, ocr, Arc::new(ThreadSleeper), settings)
    }

    /// Scripted OCR service and a caller-provided sleeper.
    pub fn with_ocr(
        ocr: Arc<dyn OcrService>,
        sleeper: Arc<dyn Sleeper>,
        settings: PollSettings,
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(FsObjectStore::new(temp_dir.path()));
        Self::assemble(temp_dir, store, ocr, sleeper, settings)
    }

    fn assemble(
        temp_dir: TempDir,
        store: Arc<FsObjectStore>,
        ocr: Arc<dyn OcrService>,
        sleeper: Arc<dyn Sleeper>,
        settings: PollSettings,
    ) -> Self {
        let config = Arc::new(PipelineConfig {
            storage_root: temp_dir.path().to_path_buf(),
            database_path: temp_dir.path().join("respondr.db"),
            parsed_container: PARSED.to_string(),
            poll: settings,
            tesseract_enabled: false,
            tesseract_languages: vec!["eng".to_string()],
            tesseract_dpi: 300,
        });
        let db = Database::open_in_memory().expect("Failed to open database");
        let pipeline = Pipeline::new(config, ocr, store.clone(), Arc::new(db.clone()), sleeper);

        Self {
            temp_dir,
            store,
            db,
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn upload(&self, key: &str, content: &[u8]) -> SourceLocation {
        self.store
            .put(UPLOADS, key, content)
            .expect("Failed to store upload");
        SourceLocation::new(UPLOADS, key)
    }

    pub fn upload_sample(&self, org: &str, sample: &SampleDocument) -> SourceLocation {
        let pdf = sample.to_pdf().expect("Failed to render sample PDF");
        self.upload(&format!("{}/{}", org, sample.file_name), &pdf)
    }

    pub fn stored_text(&self, key: &str) -> Option<String> {
        self.store
            .get(PARSED, key)
            .ok()
            .map(|bytes| String::from_utf8(bytes).expect("stored text is UTF-8"))
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(Arc::new(self.db.clone()), self.store.clone(), PARSED)
    }
}

/// What a scripted job does once submitted.
#[derive(Clone)]
pub enum Script {
    /// Reports IN_PROGRESS this many times, then succeeds with the pages.
    Succeed {
        in_progress_polls: u32,
        pages: Vec<Vec<String>>,
    },
    Fail(String),
    NeverFinish,
}

/// OCR service replaying a fixed script for every job. Result blocks are
/// served one detected page per result page to exercise token following.
pub struct ScriptedOcr {
    script: Script,
    polls: AtomicU32,
    submitted: Mutex<Vec<SourceLocation>>,
}

impl ScriptedOcr {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            polls: AtomicU32::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn lines(lines: &[&str]) -> Self {
        Self::new(Script::Succeed {
            in_progress_polls: 0,
            pages: vec![lines.iter().map(|l| l.to_string()).collect()],
        })
    }

    pub fn status_polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<SourceLocation> {
        self.submitted.lock().unwrap().clone()
    }
}

impl OcrService for ScriptedOcr {
    fn start_text_detection(&self, source: &SourceLocation) -> Result<String, OcrError> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(source.clone());
        Ok(format!("job-{}", submitted.len()))
    }

    fn get_text_detection(
        &self,
        _job_id: &str,
        next_token: Option<&str>,
    ) -> Result<TextDetectionPage, OcrError> {
        match &self.script {
            Script::Fail(message) => {
                self.polls.fetch_add(1, Ordering::SeqCst);
                Ok(TextDetectionPage::failed(message.clone()))
            }
            Script::NeverFinish => {
                self.polls.fetch_add(1, Ordering::SeqCst);
                Ok(TextDetectionPage::in_progress())
            }
            Script::Succeed {
                in_progress_polls,
                pages,
            } => {
                if next_token.is_none() {
                    let polls = self.polls.fetch_add(1, Ordering::SeqCst);
                    if polls < *in_progress_polls {
                        return Ok(TextDetectionPage::in_progress());
                    }
                }
                let index: usize = match next_token {
                    Some(token) => token
                        .parse()
                        .map_err(|_| OcrError::InvalidToken(token.to_string()))?,
                    None => 0,
                };
                let Some(lines) = pages.get(index) else {
                    return Ok(TextDetectionPage::succeeded(Vec::new(), None));
                };
                let mut blocks = vec![Block::page()];
                blocks.extend(lines.iter().map(|l| Block::line(l.as_str())));
                let next = (index + 1 < pages.len()).then(|| (index + 1).to_string());
                Ok(TextDetectionPage::succeeded(blocks, next))
            }
        }
    }
}

/// Sleeper that records requested durations instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
