use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use super::{Block, OcrService, TextDetectionPage};
use crate::error::OcrError;
use crate::metadata::SourceLocation;
use crate::storage::ObjectStore;

#[cfg(feature = "tesseract")]
use super::TesseractRecognizer;

/// Blocks returned per result page.
pub const BLOCKS_PER_RESULT_PAGE: usize = 1000;

/// Pattern lopdf emits for CID fonts it cannot decode.
const IDENTITY_H_PATTERN: &str = "?Identity-H Unimplemented?";

/// Text shorter than this is accepted regardless of composition.
const MIN_TOTAL_CHARS: usize = 50;

/// Below this alphanumeric share the text layer is treated as garbled.
const MIN_ALPHANUMERIC_PERCENT: usize = 10;

enum JobEntry {
    Running,
    Done(Vec<Block>),
    Failed(String),
}

type JobTable = Arc<Mutex<HashMap<String, JobEntry>>>;

/// In-process text detection over PDFs held in an [`ObjectStore`].
///
/// Each job runs on its own thread. The PDF text layer is read with lopdf;
/// with the `tesseract` feature, pages without a usable text layer are
/// rendered and recognised instead. A finished job is dropped from the job
/// table once its last result page (or its failure) has been served.
pub struct LocalOcrService {
    store: Arc<dyn ObjectStore>,
    jobs: JobTable,
    #[cfg(feature = "tesseract")]
    recognizer: Option<TesseractRecognizer>,
}

impl LocalOcrService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            #[cfg(feature = "tesseract")]
            recognizer: None,
        }
    }

    #[cfg(feature = "tesseract")]
    pub fn with_recognizer(mut self, recognizer: TesseractRecognizer) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    fn lock_jobs(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, JobEntry>>, OcrError> {
        self.jobs
            .lock()
            .map_err(|_| OcrError::Service("job table lock poisoned".to_string()))
    }
}

impl OcrService for LocalOcrService {
    fn start_text_detection(&self, source: &SourceLocation) -> Result<String, OcrError> {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.lock_jobs()?.insert(job_id.clone(), JobEntry::Running);

        let store = Arc::clone(&self.store);
        let jobs = Arc::clone(&self.jobs);
        let job_source = source.clone();
        let thread_job_id = job_id.clone();
        #[cfg(feature = "tesseract")]
        let recognizer = self.recognizer.clone();

        std::thread::Builder::new()
            .name(format!("ocr-{}", &job_id[..8]))
            .spawn(move || {
                let _span = tracing::info_span!(
                    "ocr.local",
                    job_id = %thread_job_id,
                    file = %crate::sanitize::redact_key(&job_source.key)
                )
                .entered();

                let outcome = store
                    .get(&job_source.container, &job_source.key)
                    .map_err(|e| e.to_string())
                    .and_then(|bytes| {
                        catch_detection_panic(|| {
                            #[cfg(feature = "tesseract")]
                            {
                                detect_blocks(&bytes, recognizer.as_ref())
                            }
                            #[cfg(not(feature = "tesseract"))]
                            {
                                detect_blocks(&bytes)
                            }
                        })
                    });

                let entry = match outcome {
                    Ok(blocks) => {
                        tracing::debug!(blocks = blocks.len(), "text detection finished");
                        JobEntry::Done(blocks)
                    }
                    Err(message) => {
                        tracing::warn!(error = %message, "text detection failed");
                        JobEntry::Failed(message)
                    }
                };
                if let Ok(mut jobs) = jobs.lock() {
                    jobs.insert(thread_job_id, entry);
                }
            })
            .map_err(|e| {
                if let Ok(mut jobs) = self.jobs.lock() {
                    jobs.remove(&job_id);
                }
                OcrError::StartFailed {
                    source_key: source.key.clone(),
                    reason: e.to_string(),
                }
            })?;

        Ok(job_id)
    }

    fn get_text_detection(
        &self,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<TextDetectionPage, OcrError> {
        let mut jobs = self.lock_jobs()?;
        let entry = jobs
            .get(job_id)
            .ok_or_else(|| OcrError::UnknownJob(job_id.to_string()))?;

        let page = match entry {
            JobEntry::Running => return Ok(TextDetectionPage::in_progress()),
            JobEntry::Failed(message) => TextDetectionPage::failed(message.clone()),
            JobEntry::Done(blocks) => result_page(blocks, next_token)?,
        };

        // Settled jobs are forgotten once their last page has been served.
        if page.next_token.is_none() {
            jobs.remove(job_id);
        }
        Ok(page)
    }
}

fn result_page(blocks: &[Block], next_token: Option<&str>) -> Result<TextDetectionPage, OcrError> {
    let offset = match next_token {
        None => 0,
        Some(token) => token
            .parse::<usize>()
            .ok()
            .filter(|offset| *offset <= blocks.len())
            .ok_or_else(|| OcrError::InvalidToken(token.to_string()))?,
    };
    let end = (offset + BLOCKS_PER_RESULT_PAGE).min(blocks.len());
    let next_token = (end < blocks.len()).then(|| end.to_string());

    Ok(TextDetectionPage::succeeded(
        blocks[offset..end].to_vec(),
        next_token,
    ))
}

/// Runs a detection pass, turning a panic inside the PDF decoder into a
/// job failure.
fn catch_detection_panic<F>(detect: F) -> Result<Vec<Block>, String>
where
    F: FnOnce() -> Result<Vec<Block>, String>,
{
    panic::catch_unwind(AssertUnwindSafe(detect)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(format!("text detection panicked: {reason}"))
    })
}

#[cfg(not(feature = "tesseract"))]
fn detect_blocks(pdf_bytes: &[u8]) -> Result<Vec<Block>, String> {
    let doc = lopdf::Document::load_mem(pdf_bytes).map_err(|e| format!("failed to load PDF: {e}"))?;

    let mut blocks = Vec::new();
    for (page_num, _) in doc.get_pages() {
        let text = doc.extract_text(&[page_num]).unwrap_or_default();
        if should_use_ocr(&text) {
            tracing::debug!(page = page_num, "page has no usable text layer");
        }
        push_page(&mut blocks, &text);
    }
    Ok(blocks)
}

#[cfg(feature = "tesseract")]
fn detect_blocks(
    pdf_bytes: &[u8],
    recognizer: Option<&TesseractRecognizer>,
) -> Result<Vec<Block>, String> {
    let doc = match lopdf::Document::load_mem(pdf_bytes) {
        Ok(doc) => doc,
        Err(e) => {
            let recognizer = recognizer.ok_or_else(|| format!("failed to load PDF: {e}"))?;
            tracing::warn!(error = %e, "lopdf could not parse PDF, recognising all pages");
            let mut blocks = Vec::new();
            for page_text in recognizer.recognize_pdf(pdf_bytes).map_err(|e| e.to_string())? {
                push_page(&mut blocks, &page_text);
            }
            return Ok(blocks);
        }
    };

    let mut blocks = Vec::new();
    for (page_num, _) in doc.get_pages() {
        let mut text = doc.extract_text(&[page_num]).unwrap_or_default();
        if should_use_ocr(&text) {
            if let Some(recognizer) = recognizer {
                let _span = tracing::info_span!("ocr.tesseract_fallback", page = page_num).entered();
                match recognizer.recognize_page(pdf_bytes, page_num) {
                    Ok(recognized) => text = recognized,
                    Err(e) => tracing::warn!(page = page_num, error = %e, "page recognition failed"),
                }
            }
        }
        push_page(&mut blocks, &text);
    }
    Ok(blocks)
}

/// One `PAGE` block followed by a `LINE` block per non-empty line.
fn push_page(blocks: &mut Vec<Block>, page_text: &str) {
    blocks.push(Block::page());
    blocks.extend(
        page_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Block::line),
    );
}

/// True when a page's text layer is empty, consists only of font decoding
/// errors, or is mostly non-alphanumeric.
fn should_use_ocr(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }

    let cleaned = trimmed
        .replace(IDENTITY_H_PATTERN, "")
        .replace(['\n', ' '], "");
    if cleaned.is_empty() {
        return true;
    }

    let total_chars = trimmed.chars().count();
    let alphanumeric_chars = trimmed.chars().filter(|c| c.is_alphanumeric()).count();
    total_chars > MIN_TOTAL_CHARS && alphanumeric_chars * 100 < total_chars * MIN_ALPHANUMERIC_PERCENT
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::fixtures::build_text_pdf;
    use crate::ocr::{BlockType, JobStatus, PollSettings, TextDetectionPoller, ThreadSleeper};
    use crate::storage::FsObjectStore;
    use tempfile::TempDir;

    fn fast_poll() -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(20),
            max_attempts: 250,
        }
    }

    fn service_with(key: &str, content: &[u8]) -> (TempDir, LocalOcrService) {
        let temp_dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp_dir.path());
        store.put("uploads", key, content).unwrap();
        (temp_dir, LocalOcrService::new(Arc::new(store)))
    }

    #[test]
    fn test_extracts_lines_and_pages() {
        let pdf = build_text_pdf(&[
            vec!["Fire Evacuation Plan", "Version 2.1"],
            vec!["Assembly point: north lot"],
        ])
        .unwrap();
        let (_dir, service) = service_with("acme/plan.pdf", &pdf);

        let poller = TextDetectionPoller::new(&service, &ThreadSleeper, fast_poll());
        let extracted = poller
            .extract(&SourceLocation::new("uploads", "acme/plan.pdf"))
            .unwrap();

        assert_eq!(extracted.page_count, 2);
        assert!(extracted.text.contains("Fire Evacuation Plan"), "{:?}", extracted.text);
        assert!(extracted.text.contains("Assembly point: north lot"));
    }

    #[test]
    fn test_invalid_pdf_fails_job() {
        let (_dir, service) = service_with("bad.pdf", b"not a pdf");

        let poller = TextDetectionPoller::new(&service, &ThreadSleeper, fast_poll());
        match poller.extract(&SourceLocation::new("uploads", "bad.pdf")) {
            Err(OcrError::JobFailed { message, .. }) => {
                assert!(message.contains("failed to load PDF"), "{}", message)
            }
            other => panic!("expected JobFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_object_fails_job() {
        let (_dir, service) = service_with("present.pdf", b"x");

        let poller = TextDetectionPoller::new(&service, &ThreadSleeper, fast_poll());
        let result = poller.extract(&SourceLocation::new("uploads", "absent.pdf"));
        assert!(matches!(result, Err(OcrError::JobFailed { .. })));
    }

    #[test]
    fn test_unknown_job() {
        let (_dir, service) = service_with("a.pdf", b"x");
        assert!(matches!(
            service.get_text_detection("nope", None),
            Err(OcrError::UnknownJob(_))
        ));
    }

    #[test]
    fn test_result_pagination() {
        let (_dir, service) = service_with("a.pdf", b"x");
        let blocks: Vec<Block> = (0..2500).map(|i| Block::line(i.to_string())).collect();
        service
            .jobs
            .lock()
            .unwrap()
            .insert("job".to_string(), JobEntry::Done(blocks));

        let first = service.get_text_detection("job", None).unwrap();
        assert_eq!(first.status, JobStatus::Succeeded);
        assert_eq!(first.blocks.len(), BLOCKS_PER_RESULT_PAGE);
        assert_eq!(first.next_token.as_deref(), Some("1000"));

        assert!(matches!(
            service.get_text_detection("job", Some("abc")),
            Err(OcrError::InvalidToken(_))
        ));
        assert!(matches!(
            service.get_text_detection("job", Some("9999")),
            Err(OcrError::InvalidToken(_))
        ));

        let last = service.get_text_detection("job", Some("2000")).unwrap();
        assert_eq!(last.blocks.len(), 500);
        assert_eq!(last.blocks[0].text.as_deref(), Some("2000"));
        assert_eq!(last.next_token, None);

        assert!(matches!(
            service.get_text_detection("job", Some("2000")),
            Err(OcrError::UnknownJob(_))
        ));
    }

    #[test]
    fn test_job_table_empty_after_extraction() {
        let pdf = build_text_pdf(&[vec!["Shelter in place procedure"]]).unwrap();
        let (_dir, service) = service_with("acme/shelter.pdf", &pdf);
        let poller = TextDetectionPoller::new(&service, &ThreadSleeper, fast_poll());

        for _ in 0..5 {
            let extracted = poller
                .extract(&SourceLocation::new("uploads", "acme/shelter.pdf"))
                .unwrap();
            assert!(extracted.text.contains("Shelter in place procedure"));
        }
        assert!(poller
            .extract(&SourceLocation::new("uploads", "acme/absent.pdf"))
            .is_err());

        assert!(service.jobs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_job_reported_once() {
        let (_dir, service) = service_with("a.pdf", b"x");
        service
            .jobs
            .lock()
            .unwrap()
            .insert("job".to_string(), JobEntry::Failed("bad input".to_string()));

        let page = service.get_text_detection("job", None).unwrap();
        assert_eq!(page.status, JobStatus::Failed);
        assert_eq!(page.status_message.as_deref(), Some("bad input"));
        assert!(matches!(
            service.get_text_detection("job", None),
            Err(OcrError::UnknownJob(_))
        ));
    }

    #[test]
    fn test_detection_panic_becomes_failure() {
        let result = catch_detection_panic(|| panic!("malformed xref"));
        match result {
            Err(message) => assert!(message.contains("malformed xref"), "{}", message),
            Ok(blocks) => panic!("expected failure, got {} blocks", blocks.len()),
        }

        let ok = catch_detection_panic(|| Ok(vec![Block::page()])).unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn test_push_page_skips_blank_lines() {
        let mut blocks = Vec::new();
        push_page(&mut blocks, "  first  \n\n second\n   \n");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].block_type, BlockType::Page);
        assert_eq!(blocks[1].text.as_deref(), Some("first"));
        assert_eq!(blocks[2].text.as_deref(), Some("second"));
    }

    #[test]
    fn test_should_use_ocr() {
        assert!(should_use_ocr(""));
        assert!(should_use_ocr("   \n  "));
        assert!(should_use_ocr("?Identity-H Unimplemented??Identity-H Unimplemented?"));
        assert!(should_use_ocr(&"!@#$%^&*()".repeat(10)));
        assert!(!should_use_ocr("Fire evacuation routes are posted on every floor."));
        assert!(!should_use_ocr("!!"));
    }
}
