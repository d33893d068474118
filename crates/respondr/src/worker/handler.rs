use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::pipeline::Pipeline;
use crate::sanitize;

use super::event::StorageEvent;

pub const SUCCESS_BODY: &str = "Document processing completed successfully";

/// Status response returned to the notification source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn ok() -> Self {
        Self {
            status_code: 200,
            body: SUCCESS_BODY.to_string(),
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            status_code: 500,
            body: format!("Error: {}", message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Processes the event's records in order. Non-PDF keys are skipped; the
/// first failing record ends the batch with a 500 response.
pub fn handle_event(pipeline: &Pipeline, event: &StorageEvent) -> HandlerResponse {
    for source in event.sources() {
        let file = sanitize::redact_key(&source.key);
        if !source.is_pdf() {
            info!(container = %source.container, %file, "Skipping non-PDF object");
            continue;
        }

        info!(container = %source.container, %file, "Processing object");
        match pipeline.process(source) {
            Ok(record) => {
                info!(
                    document_id = %record.document_id,
                    document_type = %record.document_type,
                    "Document stored"
                );
            }
            Err(e) => {
                error!(%file, error = %e, "Error processing document");
                return HandlerResponse::error(e);
            }
        }
    }

    HandlerResponse::ok()
}

/// Like [`handle_event`], but starting from the raw notification text.
/// A malformed document yields a 500 response.
pub fn handle_event_json(pipeline: &Pipeline, input: &str) -> HandlerResponse {
    match StorageEvent::from_json(input) {
        Ok(event) => handle_event(pipeline, &event),
        Err(e) => {
            error!(error = %e, "Rejected storage notification");
            HandlerResponse::error(e)
        }
    }
}
