//! Completion notifications.
//!
//! Notification is best-effort: a delivery failure is logged and never
//! changes the outcome of the job it belongs to.

pub mod email;

pub use email::EmailNotifier;

use tracing::info;

/// Terminal outcome of a job, as seen by the notification layer.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed {
        job_id: String,
        display_name: String,
    },
    Failed {
        job_id: String,
        display_name: String,
        error: String,
    },
}

impl JobOutcome {
    pub fn job_id(&self) -> &str {
        match self {
            JobOutcome::Completed { job_id, .. } | JobOutcome::Failed { job_id, .. } => job_id,
        }
    }
}

/// Delivers a terminal-outcome notification to a requester-supplied target.
pub trait Notifier: Send + Sync {
    fn notify(&self, target: &str, outcome: &JobOutcome);
}

/// Fallback notifier used when no SMTP server is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, target: &str, outcome: &JobOutcome) {
        info!(
            target_address = target,
            job_id = outcome.job_id(),
            "notification channel not configured, outcome logged only"
        );
    }
}

pub(crate) fn compose_subject(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Completed { display_name, .. } => {
            format!("Your PDF is ready: {display_name}")
        }
        JobOutcome::Failed { display_name, .. } => {
            format!("PDF processing failed: {display_name}")
        }
    }
}

pub(crate) fn compose_body(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Completed {
            job_id,
            display_name,
        } => format!(
            "Processing of {display_name} has finished.\n\n\
             Use job id {job_id} to download the result.\n\
             The file is kept for a limited time, so please fetch it soon.\n"
        ),
        JobOutcome::Failed {
            job_id,
            display_name,
            error,
        } => format!(
            "Processing of {display_name} (job {job_id}) failed.\n\n\
             Reason: {error}\n\n\
             Please check the document and submit it again.\n"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_names_the_document() {
        let outcome = JobOutcome::Completed {
            job_id: "j1".to_string(),
            display_name: "fixed_report.pdf".to_string(),
        };
        assert_eq!(compose_subject(&outcome), "Your PDF is ready: fixed_report.pdf");
    }

    #[test]
    fn test_completed_body_references_job_id() {
        let outcome = JobOutcome::Completed {
            job_id: "abc-123".to_string(),
            display_name: "fixed_report.pdf".to_string(),
        };
        let body = compose_body(&outcome);
        assert!(body.contains("abc-123"));
        assert!(body.contains("fixed_report.pdf"));
    }

    #[test]
    fn test_failed_body_carries_reason() {
        let outcome = JobOutcome::Failed {
            job_id: "abc-123".to_string(),
            display_name: "fixed_report.pdf".to_string(),
            error: "normalize failed: exit status 1".to_string(),
        };
        let body = compose_body(&outcome);
        assert!(body.contains("normalize failed: exit status 1"));
    }
}
