use std::sync::Arc;

use tracing::{debug, info_span, warn};

use crate::db::{Database, MetadataStore};
use crate::error::RespondrError;
use crate::metadata::{DocumentRecord, FileMetadata, MetadataBuilder, SourceLocation};
use crate::ocr::{ExtractedText, LocalOcrService, OcrService, Sleeper, TextDetectionPoller, ThreadSleeper};
use crate::sanitize;
use crate::storage::{sha256_hex, FsObjectStore, ObjectStore};
use crate::worker::job::{Job, JobResult};

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;
use super::progress::{JobPhase, NoopProgress, ProgressEvent, ProgressReporter};

/// Per-document unit of work: extract text, read file facts, build the
/// metadata record, persist text and record.
///
/// Holds no per-document state, so one instance can serve many threads.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    ocr: Arc<dyn OcrService>,
    store: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
    sleeper: Arc<dyn Sleeper>,
    builder: MetadataBuilder,
}

impl Pipeline {
    /// Production constructor: filesystem object store, SQLite metadata
    /// store and the in-process OCR service.
    pub fn from_config(config: Arc<PipelineConfig>) -> Result<Self, RespondrError> {
        let store: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(&config.storage_root));
        let database = Database::open(&config.database_path)?;
        let ocr = LocalOcrService::new(Arc::clone(&store));

        #[cfg(feature = "tesseract")]
        let ocr = if config.tesseract_enabled {
            ocr.with_recognizer(crate::ocr::TesseractRecognizer::new(
                &config.tesseract_languages,
                config.tesseract_dpi,
            ))
        } else {
            ocr
        };
        #[cfg(not(feature = "tesseract"))]
        if config.tesseract_enabled {
            warn!("Tesseract fallback requested but this build lacks the `tesseract` feature");
        }

        Ok(Self::new(
            config,
            Arc::new(ocr),
            store,
            Arc::new(database),
            Arc::new(ThreadSleeper),
        ))
    }

    /// Constructor with explicit collaborators.
    pub fn new(
        config: Arc<PipelineConfig>,
        ocr: Arc<dyn OcrService>,
        store: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            config,
            ocr,
            store,
            metadata,
            sleeper,
            builder: MetadataBuilder::default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn object_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    pub fn metadata_store(&self) -> Arc<dyn MetadataStore> {
        Arc::clone(&self.metadata)
    }

    /// Processes one source object and returns the stored record.
    pub fn process(&self, source: SourceLocation) -> Result<DocumentRecord, PipelineError> {
        let mut ctx = PipelineContext::new(Job::new(source));
        self.execute(&mut ctx, &NoopProgress)?;
        ctx.record
            .ok_or_else(|| PipelineError::Incomplete("record was not built".to_string()))
    }

    /// Run the full pipeline for a single job.
    /// Returns a (JobResult, PipelineContext) pair.
    pub fn run(
        &self,
        mut ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> (JobResult, PipelineContext) {
        match self.execute(&mut ctx, progress) {
            Ok(()) => match (&ctx.record, &ctx.text_key) {
                (Some(record), Some(text_key)) => {
                    progress.report(ProgressEvent::Completed {
                        document_id: record.document_id.clone(),
                        document_type: record.document_type,
                        text_key: text_key.clone(),
                    });
                    let result = JobResult::success(&ctx.job, record, text_key.clone());
                    (result, ctx)
                }
                _ => {
                    let error = "pipeline finished without a record".to_string();
                    progress.report(ProgressEvent::Failed {
                        error: error.clone(),
                    });
                    (JobResult::failure(&ctx.job, error), ctx)
                }
            },
            Err(e) => {
                let error = e.to_string();
                progress.report(ProgressEvent::Failed {
                    error: error.clone(),
                });
                (JobResult::failure(&ctx.job, error), ctx)
            }
        }
    }

    fn execute(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let source = ctx.job.source.clone();
        let _pipeline_span = info_span!("pipeline",
            job_id = %ctx.job.id,
            container = %source.container,
            file = %sanitize::redact_key(&source.key),
            key_hash = %sanitize::hash_key(&source.key),
        )
        .entered();

        // Step 1: Extract text
        let extracted = {
            let _step = info_span!("extract_text").entered();
            progress.report(ProgressEvent::Phase {
                phase: JobPhase::ExtractingText,
                message: "Running text detection...".to_string(),
            });
            self.step_extract_text(&source)?
        };
        debug!(
            chars = extracted.text.len(),
            pages = extracted.page_count,
            "text extracted"
        );
        ctx.extracted = Some(extracted.clone());

        // Step 2: File metadata
        let file = {
            let _step = info_span!("file_metadata").entered();
            progress.report(ProgressEvent::Phase {
                phase: JobPhase::ReadingFileMetadata,
                message: "Reading size and checksum...".to_string(),
            });
            self.step_file_metadata(&source)?
        };
        ctx.file = Some(file.clone());

        // Step 3: Build record
        let record = {
            let _step = info_span!("build_record").entered();
            progress.report(ProgressEvent::Phase {
                phase: JobPhase::Classifying,
                message: "Inferring document metadata...".to_string(),
            });
            self.builder
                .build(&extracted.text, extracted.page_count, &file, &source)
        };
        debug!(
            document_id = %record.document_id,
            document_type = %record.document_type,
            "record built"
        );

        // Step 4: Persist
        {
            let _step = info_span!("persist", document_id = %record.document_id).entered();
            progress.report(ProgressEvent::Phase {
                phase: JobPhase::Persisting,
                message: "Storing text and metadata...".to_string(),
            });
            let text_key = record.text_key();
            self.step_persist(&record, &text_key, &extracted.text)?;
            ctx.record = Some(record);
            ctx.text_key = Some(text_key);
        }

        Ok(())
    }

    fn step_extract_text(&self, source: &SourceLocation) -> Result<ExtractedText, PipelineError> {
        let poller = TextDetectionPoller::new(self.ocr.as_ref(), self.sleeper.as_ref(), self.config.poll);
        Ok(poller.extract(source)?)
    }

    fn step_file_metadata(&self, source: &SourceLocation) -> Result<FileMetadata, PipelineError> {
        let head = self.store.head(&source.container, &source.key)?;
        let content = self.store.get(&source.container, &source.key)?;
        Ok(FileMetadata {
            size_bytes: head.size_bytes,
            checksum_sha256: sha256_hex(&content),
        })
    }

    /// Writes the text object before the record, so a stored record always
    /// has its text. A failed record write can leave an orphaned text object.
    fn step_persist(
        &self,
        record: &DocumentRecord,
        text_key: &str,
        text: &str,
    ) -> Result<(), PipelineError> {
        self.store
            .put(&self.config.parsed_container, text_key, text.as_bytes())?;
        if let Err(e) = self.metadata.put_record(record) {
            warn!(
                document_id = %record.document_id,
                "record write failed after text object was stored"
            );
            return Err(e.into());
        }
        Ok(())
    }
}
