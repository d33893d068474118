pub mod event;
pub mod handler;
pub mod job;
pub mod pool;

pub use event::StorageEvent;
pub use handler::{handle_event, handle_event_json, HandlerResponse};
pub use job::{Job, JobResult};
pub use pool::WorkerPool;

// Re-export crossbeam_channel for use in main
pub use crossbeam_channel;
