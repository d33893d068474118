use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::pipeline::progress::{JobPhase, LogProgress, ProgressEvent, ProgressReporter};
use crate::pipeline::{Pipeline, PipelineContext};
use crate::worker::job::{Job, JobResult};

/// Fixed set of threads sharing one pipeline. Each document runs as an
/// independent job; results come back on a channel in completion order.
pub struct WorkerPool {
    job_sender: Sender<Job>,
    result_receiver: Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(pipeline: Arc<Pipeline>, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (job_sender, job_receiver) = bounded::<Job>(worker_count * 2);
        let (result_sender, result_receiver) = bounded::<JobResult>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_pipeline = Arc::clone(&pipeline);

            let handle = thread::Builder::new()
                .name(format!("respondr-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(worker_id, job_rx, result_tx, shutdown_flag, worker_pipeline);
                });

            match handle {
                Ok(handle) => workers.push(handle),
                Err(e) => error!("Failed to spawn worker {}: {}", worker_id, e),
            }
        }

        info!("Started {} workers", workers.len());

        Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
        }
    }

    pub fn submit(&self, job: Job) -> Result<(), crate::error::WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) || self.workers.is_empty() {
            return Err(crate::error::WorkerError::ChannelClosed);
        }

        self.job_sender
            .send(job)
            .map_err(|_| crate::error::WorkerError::ChannelClosed)
    }

    pub fn try_recv_result(&self) -> Option<JobResult> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<JobResult> {
        self.result_receiver.recv().ok()
    }

    pub fn recv_result_timeout(&self, timeout: std::time::Duration) -> Option<JobResult> {
        self.result_receiver.recv_timeout(timeout).ok()
    }

    /// A receiver for consuming results on another thread. Iteration ends
    /// once every worker has stopped.
    pub fn results(&self) -> Receiver<JobResult> {
        self.result_receiver.clone()
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Closes the job queue and joins every worker. Jobs already queued are
    /// still processed unless [`shutdown`](Self::shutdown) was called.
    /// Results not yet received are returned.
    pub fn wait(self) -> Vec<JobResult> {
        drop(self.job_sender);

        let mut pending = Vec::new();
        for (i, worker) in self.workers.into_iter().enumerate() {
            // Keep the result channel drained so no worker blocks on send.
            while !worker.is_finished() {
                if let Ok(result) = self
                    .result_receiver
                    .recv_timeout(std::time::Duration::from_millis(50))
                {
                    pending.push(result);
                }
            }
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }
        pending.extend(self.result_receiver.try_iter());

        info!("All workers have stopped");
        pending
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<Job>,
    result_sender: Sender<JobResult>,
    shutdown: Arc<AtomicBool>,
    pipeline: Arc<Pipeline>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(job) => {
                debug!("Worker {} processing job {}", worker_id, job.id);

                let progress = LogProgress::new(&job.id);
                progress.report(ProgressEvent::Phase {
                    phase: JobPhase::Queued,
                    message: "Job queued for processing".to_string(),
                });

                let ctx = PipelineContext::new(job);
                let (result, _ctx) = pipeline.run(ctx, &progress);

                if let Err(e) = result_sender.send(result) {
                    error!("Worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
