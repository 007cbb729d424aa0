use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, error, info};
use tokio::sync::broadcast;

use crate::broadcast::JobProgressEvent;
use crate::config::ToolsConfig;
use crate::error::WorkerError;
use crate::notify::{JobOutcome, Notifier};
use crate::pipeline::{Pipeline, PipelineContext, PipelineRequest, TrackingProgress};
use crate::registry::JobRegistry;
use crate::storage::FileStorage;
use crate::worker::job::JobResult;

/// Fixed-size pool of processing threads fed from a bounded queue.
///
/// Admission uses `try_send`, so a full queue is reported to the caller
/// immediately instead of blocking the submitting thread.
pub struct WorkerPool {
    job_sender: Sender<PipelineRequest>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Starts `worker_count` threads, each with its own pipeline instance.
    ///
    /// # Panics
    /// Panics if `worker_count` or `queue_capacity` is 0.
    pub fn new(
        tools: &ToolsConfig,
        storage: FileStorage,
        worker_count: usize,
        queue_capacity: usize,
        registry: Arc<JobRegistry>,
        notifier: Arc<dyn Notifier>,
        progress_sender: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
    ) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        assert!(queue_capacity > 0, "queue_capacity must be > 0");

        let (job_sender, job_receiver) = bounded::<PipelineRequest>(queue_capacity);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let tools = tools.clone();
            let storage = storage.clone();
            let registry = Arc::clone(&registry);
            let notifier = Arc::clone(&notifier);
            let progress_sender = progress_sender.clone();

            let handle = thread::spawn(move || {
                run_worker(
                    worker_id,
                    job_rx,
                    shutdown_flag,
                    &tools,
                    storage,
                    registry,
                    notifier,
                    progress_sender,
                );
            });
            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Self {
            job_sender,
            workers,
            shutdown,
        }
    }

    /// Enqueues a job without blocking. A full queue is an error the caller
    /// must surface, never a silent wait.
    pub fn submit(&self, request: PipelineRequest) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.job_sender.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => WorkerError::QueueFull,
            TrySendError::Disconnected(_) => WorkerError::ChannelClosed,
        })
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Waits for all workers to drain and exit.
    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }
}

#[allow(clippy::too_many_arguments)]
fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<PipelineRequest>,
    shutdown: Arc<AtomicBool>,
    tools: &ToolsConfig,
    storage: FileStorage,
    registry: Arc<JobRegistry>,
    notifier: Arc<dyn Notifier>,
    progress_sender: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
) {
    debug!("Worker {} started", worker_id);

    let pipeline = Pipeline::from_config(tools, storage);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(request) => {
                debug!("Worker {} processing job {}", worker_id, request.job_id);

                let Some(record) = registry.get(&request.job_id) else {
                    error!(
                        "Worker {} dequeued unknown job {}, dropping",
                        worker_id, request.job_id
                    );
                    continue;
                };
                registry.mark_processing(&request.job_id);

                let progress = TrackingProgress::new(
                    request.job_id.clone(),
                    record.display_name.clone(),
                    Arc::clone(&registry),
                    progress_sender.clone(),
                );

                let ctx = PipelineContext::new(request);
                let (result, _ctx) = pipeline.run(ctx, &progress);

                if let Some(target) = &record.notify_target {
                    let outcome = outcome_for(&result, &record.display_name);
                    notifier.notify(target, &outcome);
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

fn outcome_for(result: &JobResult, display_name: &str) -> JobOutcome {
    if result.success {
        JobOutcome::Completed {
            job_id: result.job_id.clone(),
            display_name: display_name.to_string(),
        }
    } else {
        JobOutcome::Failed {
            job_id: result.job_id.clone(),
            display_name: display_name.to_string(),
            error: result
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        }
    }
}
