//! Concurrent-safe job registry and per-job state machine.
//!
//! Records move forward only: Queued → Processing → {Completed | Failed}.
//! Attempts to leave a terminal state or to skip backward are logged and
//! rejected, never panicked on. Each mutation happens under one write lock,
//! so status pollers can never observe a partially-updated record (e.g. a
//! `Completed` state with no result path).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Position in the forward-only lifecycle.
    fn rank(self) -> u8 {
        match self {
            JobState::Queued => 0,
            JobState::Processing => 1,
            JobState::Completed | JobState::Failed => 2,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Processing => write!(f, "processing"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Opaque unique identifier, the sole external handle for status/download.
    pub id: String,
    /// Result filename surfaced to the requester.
    pub display_name: String,
    /// Contact address for completion/failure notification; `None` means none.
    pub notify_target: Option<String>,
    pub state: JobState,
    /// Latest-wins description of the current step.
    pub progress_note: String,
    /// Present only when `state` is `Failed`.
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Final artifact location; set exactly once, with the `Completed` transition.
    pub result_path: Option<PathBuf>,
}

#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new id and inserts a record in `Queued` state.
    pub fn create(&self, display_name: &str, notify_target: Option<String>) -> JobRecord {
        let record = JobRecord {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            notify_target,
            state: JobState::Queued,
            progress_note: String::new(),
            error_detail: None,
            created_at: Utc::now(),
            completed_at: None,
            result_path: None,
        };

        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        jobs.insert(record.id.clone(), record.clone());
        record
    }

    pub fn get(&self, id: &str) -> Option<JobRecord> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        jobs.get(id).cloned()
    }

    /// Removes a record. Used to roll back admission when scheduling fails;
    /// never called for a job a worker owns.
    pub fn remove(&self, id: &str) -> Option<JobRecord> {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        jobs.remove(id)
    }

    pub fn len(&self) -> usize {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrites the advisory progress note. Ignored for terminal jobs.
    pub fn set_progress(&self, id: &str, note: &str) {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = jobs.get_mut(id) {
            if !record.state.is_terminal() {
                record.progress_note = note.to_string();
            }
        }
    }

    /// Queued → Processing. Returns false (and logs) on any other transition.
    pub fn mark_processing(&self, id: &str) -> bool {
        self.advance(id, JobState::Processing, |_| {})
    }

    /// Transition into `Completed`, recording the result location and the
    /// completion timestamp in the same critical section.
    pub fn complete(&self, id: &str, result_path: PathBuf) -> bool {
        self.advance(id, JobState::Completed, |record| {
            record.result_path = Some(result_path);
            record.completed_at = Some(Utc::now());
        })
    }

    /// Transition into `Failed`, capturing the error detail.
    pub fn fail(&self, id: &str, detail: &str) -> bool {
        self.advance(id, JobState::Failed, |record| {
            record.error_detail = Some(detail.to_string());
            record.completed_at = Some(Utc::now());
        })
    }

    fn advance(&self, id: &str, new_state: JobState, apply: impl FnOnce(&mut JobRecord)) -> bool {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let Some(record) = jobs.get_mut(id) else {
            warn!(job_id = id, "transition requested for unknown job");
            return false;
        };

        if record.state.is_terminal() || new_state.rank() <= record.state.rank() {
            warn!(
                job_id = id,
                from = %record.state,
                to = %new_state,
                "rejected non-monotonic job transition"
            );
            return false;
        }

        record.state = new_state;
        apply(record);
        true
    }
}
