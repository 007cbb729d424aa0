//! Submission, status and download facade.
//!
//! This is the single entry point an outer surface (HTTP handler, CLI)
//! talks to. Validation happens here, before any per-origin rate-limit
//! slot is consumed and before any job record or file exists, so a
//! rejected submission leaves no trace.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::broadcast::{JobProgressBroadcaster, JobProgressEvent};
use crate::config::Config;
use crate::error::{PdfmillError, QueryError, SubmitError, WorkerError};
use crate::limiter::RateLimiter;
use crate::notify::{EmailNotifier, LogNotifier, Notifier};
use crate::pipeline::{Dpi, PageSelection, PipelineRequest};
use crate::registry::{JobRegistry, JobState};
use crate::sanitize;
use crate::storage::FileStorage;
use crate::worker::WorkerPool;

const MAX_FILENAME_LEN: usize = 255;
const MAX_ADDRESS_LEN: usize = 254;

/// Characters never valid in a notification address, checked in addition
/// to the format pattern.
const ADDRESS_BLACKLIST: &[char] = &['<', '>', '\\', '/', '|', ';', '&', ',', '`'];

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .unwrap_or_else(|e| panic!("invalid address pattern: {e}"))
    })
}

/// A file handed in for processing.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Per-submission processing options.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Address to notify when the job reaches a terminal state.
    pub notify_target: Option<String>,
    pub remove_security: bool,
    pub run_ocr: bool,
    pub add_page_numbers: bool,
    pub compress: bool,
    /// Rendering resolution; only 300, 600 and 1200 are accepted.
    pub dpi: u32,
    /// Page selection: "all", "2-9" or "1,3,7".
    pub pages: String,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            notify_target: None,
            remove_security: false,
            run_ocr: false,
            add_page_numbers: false,
            compress: false,
            dpi: Dpi::default().as_u32(),
            pages: "all".to_string(),
        }
    }
}

/// What the requester gets back from a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub job_id: String,
    pub display_name: String,
}

/// Externally visible view of a job record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub id: String,
    pub display_name: String,
    pub state: JobState,
    pub progress_note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

pub struct PdfService {
    storage: FileStorage,
    registry: Arc<JobRegistry>,
    limiter: RateLimiter,
    pool: WorkerPool,
    broadcaster: JobProgressBroadcaster,
    max_upload_bytes: u64,
}

impl PdfService {
    /// Builds the full service from config: storage, registry, rate limiter
    /// and the worker pool with its notification channel.
    pub fn new(config: Config) -> Result<Self, PdfmillError> {
        let storage = FileStorage::new(&config.storage_root);
        storage.init()?;

        let registry = Arc::new(JobRegistry::new());
        let limiter = RateLimiter::new(
            config.rate_limit.max_attempts,
            Duration::from_secs(config.rate_limit.window_secs),
        );
        let broadcaster = JobProgressBroadcaster::default();

        let notifier: Arc<dyn Notifier> = match &config.smtp {
            Some(smtp) => Arc::new(EmailNotifier::new(smtp.clone())),
            None => Arc::new(LogNotifier),
        };

        let pool = WorkerPool::new(
            &config.tools,
            storage.clone(),
            config.worker_count,
            config.queue_capacity,
            Arc::clone(&registry),
            notifier,
            Some(broadcaster.sender()),
        );

        Ok(Self {
            storage,
            registry,
            limiter,
            pool,
            broadcaster,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// Validates and enqueues an upload. `identity` is the submitting
    /// origin (e.g. a client address) used for rate limiting.
    ///
    /// Checks run in a fixed order: file, options, then the rate limit, so
    /// a malformed request never consumes a rate-limit slot.
    pub fn submit(
        &self,
        identity: &str,
        upload: Upload,
        options: SubmitOptions,
    ) -> Result<SubmissionReceipt, SubmitError> {
        validate_upload(&upload, self.max_upload_bytes)?;
        if let Some(target) = &options.notify_target {
            validate_notify_target(target)?;
        }
        let dpi = Dpi::from_value(options.dpi).ok_or(SubmitError::InvalidDpi(options.dpi))?;
        let pages = PageSelection::parse(&options.pages).map_err(SubmitError::InvalidPageSelection)?;

        if !self.limiter.admit(identity) {
            return Err(SubmitError::RateLimited);
        }

        let filename = stored_filename(&upload.filename);
        let display_name = format!("fixed_{filename}");

        let record = self
            .registry
            .create(&display_name, options.notify_target.clone());

        let input_path = match self.storage.store_upload(&upload.content, &record.id, &filename) {
            Ok(path) => path,
            Err(e) => {
                self.registry.remove(&record.id);
                return Err(SubmitError::Storage(e));
            }
        };

        let request = PipelineRequest {
            job_id: record.id.clone(),
            input_path: input_path.clone(),
            output_path: self.storage.result_path(&record.id, &filename),
            remove_security: options.remove_security,
            run_ocr: options.run_ocr,
            add_page_numbers: options.add_page_numbers,
            compress: options.compress,
            dpi,
            pages,
        };

        if let Err(e) = self.pool.submit(request) {
            // Roll back the record and the stored upload; the job never existed.
            self.registry.remove(&record.id);
            let _ = self.storage.remove(&input_path);
            return Err(match e {
                WorkerError::QueueFull => SubmitError::QueueFull,
                WorkerError::ChannelClosed => SubmitError::ShuttingDown,
            });
        }

        info!(
            job_id = %record.id,
            filename = %sanitize::redact_path(Path::new(&filename)),
            "job accepted"
        );

        Ok(SubmissionReceipt {
            job_id: record.id,
            display_name,
        })
    }

    /// Current state of a job.
    pub fn status(&self, id: &str) -> Result<JobStatus, QueryError> {
        let id = parse_id(id)?;
        let record = self
            .registry
            .get(&id)
            .ok_or_else(|| QueryError::NotFound(id.clone()))?;

        Ok(JobStatus {
            id: record.id,
            display_name: record.display_name,
            state: record.state,
            progress_note: record.progress_note,
            error_detail: record.error_detail,
            created_at: record.created_at,
            completed_at: record.completed_at,
        })
    }

    /// Location of the finished artifact, only for completed jobs.
    pub fn result(&self, id: &str) -> Result<PathBuf, QueryError> {
        let id = parse_id(id)?;
        let record = self
            .registry
            .get(&id)
            .ok_or_else(|| QueryError::NotFound(id.clone()))?;

        if record.state != JobState::Completed {
            return Err(QueryError::NotReady {
                id,
                state: record.state,
            });
        }

        let path = record
            .result_path
            .ok_or_else(|| QueryError::ResultUnavailable {
                id: id.clone(),
                reason: "result location missing".to_string(),
            })?;

        self.storage
            .resolve(&path)
            .map_err(|e| QueryError::ResultUnavailable {
                id,
                reason: e.to_string(),
            })
    }

    /// Live progress event stream for all jobs.
    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.broadcaster.subscribe()
    }

    /// Stops accepting work and waits for in-flight jobs to finish.
    pub fn shutdown(self) {
        self.pool.shutdown();
        self.pool.wait();
    }
}

fn parse_id(id: &str) -> Result<String, QueryError> {
    Uuid::parse_str(id)
        .map(|u| u.to_string())
        .map_err(|_| QueryError::InvalidId(id.to_string()))
}

fn validate_upload(upload: &Upload, max_bytes: u64) -> Result<(), SubmitError> {
    if upload.filename.is_empty() || upload.filename.len() > MAX_FILENAME_LEN {
        return Err(SubmitError::InvalidFilename(upload.filename.clone()));
    }

    let path = Path::new(&upload.filename);
    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    let mime_is_pdf = mime_guess::from_path(path)
        .first()
        .map(|m| m == mime_guess::mime::APPLICATION_PDF)
        .unwrap_or(false);
    if !is_pdf || !mime_is_pdf {
        return Err(SubmitError::UnsupportedType(upload.filename.clone()));
    }

    if upload.content.is_empty() {
        return Err(SubmitError::EmptyFile);
    }
    let size = upload.content.len() as u64;
    if size > max_bytes {
        return Err(SubmitError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }

    Ok(())
}

fn validate_notify_target(target: &str) -> Result<(), SubmitError> {
    if target.len() > MAX_ADDRESS_LEN
        || target.chars().any(|c| ADDRESS_BLACKLIST.contains(&c))
        || !address_pattern().is_match(target)
    {
        return Err(SubmitError::InvalidNotifyTarget(target.to_string()));
    }
    Ok(())
}

/// The name an upload is stored under. Hostile or exotic names collapse to
/// a safe fallback rather than being rejected.
fn stored_filename(original: &str) -> String {
    let sanitized = sanitize::sanitize_filename(original);
    if sanitized.is_empty() || sanitized == ".pdf" {
        return "document.pdf".to_string();
    }
    if Path::new(&sanitized)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
    {
        sanitized
    } else {
        format!("{sanitized}.pdf")
    }
}


#[cfg(test)]
#[cfg(unix)]
mod service_tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, Instant};

    use tempfile::TempDir;

    use crate::config::{RateLimitConfig, ToolsConfig};

    fn fake_tool(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    fn copying_tool(dir: &Path, name: &str, suffix: &str) -> String {
        let body = format!(
            r#"in="$1"
stem="${{in%.*}}"
cp "$in" "$stem{suffix}.pdf""#
        );
        fake_tool(dir, name, &body)
    }

    fn test_config(store: &Path, tool_dir: &Path, max_attempts: usize) -> Config {
        Config {
            version: "1.0".to_string(),
            storage_root: store.to_string_lossy().to_string(),
            worker_count: 1,
            queue_capacity: 8,
            max_upload_bytes: 1024 * 1024,
            rate_limit: RateLimitConfig {
                max_attempts,
                window_secs: 3600,
            },
            tools: ToolsConfig {
                unlock: copying_tool(tool_dir, "unlock", "-unlocked"),
                normalize: copying_tool(tool_dir, "normalize", "-FIXED"),
                ocr: copying_tool(tool_dir, "ocr", "-OCR"),
                paginate: copying_tool(tool_dir, "paginate", "-numbered"),
                compress: copying_tool(tool_dir, "compress", "-compressed"),
            },
            smtp: None,
        }
    }

    fn pdf_upload(name: &str) -> Upload {
        Upload {
            filename: name.to_string(),
            content: b"%PDF-1.4 test".to_vec(),
        }
    }

    fn wait_for_completed(service: &PdfService, id: &str) -> JobStatus {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let status = service.status(id).unwrap();
            if status.state.is_terminal() {
                return status;
            }
            assert!(Instant::now() < deadline, "job never finished");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_submit_process_download() {
        let store = TempDir::new().unwrap();
        let tool_dir = TempDir::new().unwrap();
        let service = PdfService::new(test_config(store.path(), tool_dir.path(), 10)).unwrap();

        let receipt = service
            .submit("10.0.0.1", pdf_upload("report.pdf"), SubmitOptions::default())
            .unwrap();
        assert_eq!(receipt.display_name, "fixed_report.pdf");

        let status = wait_for_completed(&service, &receipt.job_id);
        assert_eq!(status.state, JobState::Completed);
        assert!(status.completed_at.is_some());

        let path = service.result(&receipt.job_id).unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_fixed_report.pdf"));

        service.shutdown();
    }

    #[test]
    fn test_result_before_completion_is_not_ready() {
        let store = TempDir::new().unwrap();
        let tool_dir = TempDir::new().unwrap();
        let mut config = test_config(store.path(), tool_dir.path(), 10);
        config.tools.normalize = fake_tool(
            tool_dir.path(),
            "normalize-slow",
            r#"sleep 2
in="$1"
stem="${in%.*}"
cp "$in" "$stem-FIXED.pdf""#,
        );
        let service = PdfService::new(config).unwrap();

        let receipt = service
            .submit("10.0.0.2", pdf_upload("a.pdf"), SubmitOptions::default())
            .unwrap();

        let err = service.result(&receipt.job_id).unwrap_err();
        assert!(matches!(err, QueryError::NotReady { .. }));

        wait_for_completed(&service, &receipt.job_id);
        service.shutdown();
    }

    #[test]
    fn test_rate_limit_applies_per_identity() {
        let store = TempDir::new().unwrap();
        let tool_dir = TempDir::new().unwrap();
        let service = PdfService::new(test_config(store.path(), tool_dir.path(), 2)).unwrap();

        for i in 0..2 {
            service
                .submit(
                    "10.0.0.3",
                    pdf_upload(&format!("a{i}.pdf")),
                    SubmitOptions::default(),
                )
                .unwrap();
        }
        let err = service
            .submit("10.0.0.3", pdf_upload("a2.pdf"), SubmitOptions::default())
            .unwrap_err();
        assert!(matches!(err, SubmitError::RateLimited));

        // A different origin is unaffected.
        service
            .submit("10.0.0.4", pdf_upload("b.pdf"), SubmitOptions::default())
            .unwrap();

        service.shutdown();
    }

    #[test]
    fn test_rejected_submission_consumes_no_slot_and_leaves_no_job() {
        let store = TempDir::new().unwrap();
        let tool_dir = TempDir::new().unwrap();
        let service = PdfService::new(test_config(store.path(), tool_dir.path(), 1)).unwrap();

        // Invalid uploads fail before the limiter runs.
        for _ in 0..5 {
            let err = service
                .submit("10.0.0.5", pdf_upload("notes.txt"), SubmitOptions::default())
                .unwrap_err();
            assert!(matches!(err, SubmitError::UnsupportedType(_)));
        }

        // The single slot is still available.
        service
            .submit("10.0.0.5", pdf_upload("a.pdf"), SubmitOptions::default())
            .unwrap();

        service.shutdown();
    }

    #[test]
    fn test_invalid_options_rejected() {
        let store = TempDir::new().unwrap();
        let tool_dir = TempDir::new().unwrap();
        let service = PdfService::new(test_config(store.path(), tool_dir.path(), 10)).unwrap();

        let err = service
            .submit(
                "10.0.0.6",
                pdf_upload("a.pdf"),
                SubmitOptions {
                    dpi: 72,
                    ..SubmitOptions::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SubmitError::InvalidDpi(72)));

        let err = service
            .submit(
                "10.0.0.6",
                pdf_upload("a.pdf"),
                SubmitOptions {
                    pages: "9-2".to_string(),
                    ..SubmitOptions::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SubmitError::InvalidPageSelection(_)));

        let err = service
            .submit(
                "10.0.0.6",
                pdf_upload("a.pdf"),
                SubmitOptions {
                    notify_target: Some("not-an-email".to_string()),
                    ..SubmitOptions::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SubmitError::InvalidNotifyTarget(_)));

        service.shutdown();
    }

    #[test]
    fn test_status_of_unknown_or_malformed_id() {
        let store = TempDir::new().unwrap();
        let tool_dir = TempDir::new().unwrap();
        let service = PdfService::new(test_config(store.path(), tool_dir.path(), 10)).unwrap();

        assert!(matches!(
            service.status("../etc/passwd"),
            Err(QueryError::InvalidId(_))
        ));
        assert!(matches!(
            service.status("00000000-0000-0000-0000-000000000000"),
            Err(QueryError::NotFound(_))
        ));

        service.shutdown();
    }
}
