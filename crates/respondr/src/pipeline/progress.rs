use crate::categorizer::DocumentType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Queued,
    ExtractingText,
    ReadingFileMetadata,
    Classifying,
    Persisting,
    Completed,
    Failed,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobPhase::Queued => write!(f, "Queued"),
            JobPhase::ExtractingText => write!(f, "Extracting text"),
            JobPhase::ReadingFileMetadata => write!(f, "Reading file metadata"),
            JobPhase::Classifying => write!(f, "Classifying"),
            JobPhase::Persisting => write!(f, "Persisting"),
            JobPhase::Completed => write!(f, "Completed"),
            JobPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Events emitted by the pipeline during processing.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Phase {
        phase: JobPhase,
        message: String,
    },
    Completed {
        document_id: String,
        document_type: DocumentType,
        text_key: String,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Discards all events.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Forwards events to the log, tagged with the job id.
pub struct LogProgress {
    job_id: String,
}

impl LogProgress {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase, message } => {
                tracing::debug!(job_id = %self.job_id, %phase, "{}", message);
            }
            ProgressEvent::Completed {
                document_id,
                document_type,
                text_key,
            } => {
                tracing::info!(
                    job_id = %self.job_id,
                    %document_id,
                    %document_type,
                    %text_key,
                    "document processed"
                );
            }
            ProgressEvent::Failed { error } => {
                tracing::error!(job_id = %self.job_id, %error, "document processing failed");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Collects events for assertions.
    #[derive(Default)]
    pub struct RecordingProgress {
        pub events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingProgress {
        pub fn phases(&self) -> Vec<JobPhase> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    ProgressEvent::Phase { phase, .. } => Some(*phase),
                    _ => None,
                })
                .collect()
        }
    }

    impl ProgressReporter for RecordingProgress {
        fn report(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
