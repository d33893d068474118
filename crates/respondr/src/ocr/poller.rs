use std::time::Duration;

use super::{ExtractedText, JobStatus, OcrService, TextAssembler, TextDetectionPage};
use crate::error::OcrError;
use crate::metadata::SourceLocation;

/// Blocking wait between status checks. Tests substitute a recording
/// implementation so no real time passes.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// States of one text detection job as seen by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Submitted { job_id: String },
    Polling { job_id: String, attempt: u32 },
    Succeeded { job_id: String, first_page: TextDetectionPage },
    Failed { job_id: String, message: String },
    TimedOut { job_id: String, attempts: u32 },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Succeeded { .. } | PollState::Failed { .. } | PollState::TimedOut { .. }
        )
    }
}

/// Submits a job, waits for it to settle and collects every result page.
pub struct TextDetectionPoller<'a> {
    service: &'a dyn OcrService,
    sleeper: &'a dyn Sleeper,
    settings: PollSettings,
}

impl<'a> TextDetectionPoller<'a> {
    pub fn new(service: &'a dyn OcrService, sleeper: &'a dyn Sleeper, settings: PollSettings) -> Self {
        Self {
            service,
            sleeper,
            settings,
        }
    }

    pub fn extract(&self, source: &SourceLocation) -> Result<ExtractedText, OcrError> {
        let job_id = self.service.start_text_detection(source)?;
        tracing::debug!(job_id = %job_id, "text detection submitted");

        let mut state = PollState::Submitted { job_id };
        loop {
            state = match state {
                PollState::Succeeded { job_id, first_page } => {
                    return self.collect(&job_id, first_page)
                }
                PollState::Failed { job_id, message } => {
                    return Err(OcrError::JobFailed { job_id, message })
                }
                PollState::TimedOut { job_id, attempts } => {
                    return Err(OcrError::Timeout { job_id, attempts })
                }
                pending => self.step(pending)?,
            };
        }
    }

    /// Advances a non-terminal state by one transition.
    ///
    /// Each `Polling` state performs one status check; the sleeper is called
    /// between checks but not after the final one.
    pub fn step(&self, state: PollState) -> Result<PollState, OcrError> {
        let next = match state {
            PollState::Submitted { job_id } => PollState::Polling { job_id, attempt: 1 },
            PollState::Polling { job_id, attempt } => {
                let page = self.service.get_text_detection(&job_id, None)?;
                match page.status {
                    JobStatus::Succeeded => PollState::Succeeded {
                        job_id,
                        first_page: page,
                    },
                    JobStatus::Failed => PollState::Failed {
                        job_id,
                        message: page
                            .status_message
                            .unwrap_or_else(|| "text detection failed".to_string()),
                    },
                    JobStatus::InProgress if attempt >= self.settings.max_attempts => {
                        tracing::warn!(job_id = %job_id, attempts = attempt, "text detection timed out");
                        PollState::TimedOut {
                            job_id,
                            attempts: attempt,
                        }
                    }
                    JobStatus::InProgress => {
                        self.sleeper.sleep(self.settings.interval);
                        PollState::Polling {
                            job_id,
                            attempt: attempt + 1,
                        }
                    }
                }
            }
            terminal => terminal,
        };
        Ok(next)
    }

    fn collect(&self, job_id: &str, first_page: TextDetectionPage) -> Result<ExtractedText, OcrError> {
        let mut assembler = TextAssembler::default();
        assembler.push_blocks(&first_page.blocks);

        let mut next_token = first_page.next_token;
        while let Some(token) = next_token {
            let page = self.service.get_text_detection(job_id, Some(&token))?;
            assembler.push_blocks(&page.blocks);
            next_token = page.next_token;
        }

        Ok(assembler.finish())
    }
}
