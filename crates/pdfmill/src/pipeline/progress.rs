use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::broadcast::JobProgressEvent;
use crate::registry::{JobRegistry, JobState};

/// Progress event emitted by the pipeline while a job runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Human-readable note for the step currently executing.
    Note { message: String },
    /// The job finished and its result was stored.
    Completed { result_path: PathBuf },
    /// The job failed and no result is available.
    Failed { error: String },
}

/// Receives progress events from a running pipeline.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Reporter that discards all events. Useful for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Reporter that records progress in the job registry and fans events out
/// to broadcast subscribers.
pub struct TrackingProgress {
    job_id: String,
    display_name: String,
    registry: Arc<JobRegistry>,
    events: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
}

impl TrackingProgress {
    pub fn new(
        job_id: String,
        display_name: String,
        registry: Arc<JobRegistry>,
        events: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
    ) -> Self {
        Self {
            job_id,
            display_name,
            registry,
            events,
        }
    }

    fn publish(&self, event: JobProgressEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }
}

impl ProgressReporter for TrackingProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Note { message } => {
                self.registry.set_progress(&self.job_id, &message);
                self.publish(JobProgressEvent::new(
                    &self.job_id,
                    &self.display_name,
                    JobState::Processing,
                    &message,
                ));
            }
            ProgressEvent::Completed { result_path } => {
                self.registry.complete(&self.job_id, result_path);
                self.publish(JobProgressEvent::new(
                    &self.job_id,
                    &self.display_name,
                    JobState::Completed,
                    "Processing complete",
                ));
            }
            ProgressEvent::Failed { error } => {
                self.registry.fail(&self.job_id, &error);
                self.publish(JobProgressEvent::failed(
                    &self.job_id,
                    &self.display_name,
                    &error,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_updates_registry_progress() {
        let registry = Arc::new(JobRegistry::new());
        let record = registry.create("fixed_a.pdf", None);
        registry.mark_processing(&record.id);

        let progress = TrackingProgress::new(
            record.id.clone(),
            record.display_name.clone(),
            Arc::clone(&registry),
            None,
        );
        progress.report(ProgressEvent::Note {
            message: "Compressing PDF...".to_string(),
        });

        let fetched = registry.get(&record.id).unwrap();
        assert_eq!(fetched.progress_note, "Compressing PDF...");
    }

    #[test]
    fn completed_marks_record_with_result() {
        let registry = Arc::new(JobRegistry::new());
        let record = registry.create("fixed_a.pdf", None);
        registry.mark_processing(&record.id);

        let progress = TrackingProgress::new(
            record.id.clone(),
            record.display_name.clone(),
            Arc::clone(&registry),
            None,
        );
        progress.report(ProgressEvent::Completed {
            result_path: PathBuf::from("out/a_fixed_a.pdf"),
        });

        let fetched = registry.get(&record.id).unwrap();
        assert_eq!(fetched.state, JobState::Completed);
        assert_eq!(fetched.result_path, Some(PathBuf::from("out/a_fixed_a.pdf")));
    }

    #[test]
    fn failed_marks_record_and_broadcasts_error() {
        let registry = Arc::new(JobRegistry::new());
        let record = registry.create("fixed_a.pdf", None);
        registry.mark_processing(&record.id);

        let (sender, mut receiver) = broadcast::channel(8);
        let progress = TrackingProgress::new(
            record.id.clone(),
            record.display_name.clone(),
            Arc::clone(&registry),
            Some(Arc::new(sender)),
        );
        progress.report(ProgressEvent::Failed {
            error: "normalize failed".to_string(),
        });

        let fetched = registry.get(&record.id).unwrap();
        assert_eq!(fetched.state, JobState::Failed);
        assert_eq!(fetched.error_detail.as_deref(), Some("normalize failed"));

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.state, JobState::Failed);
        assert_eq!(event.error.as_deref(), Some("normalize failed"));
    }
}
