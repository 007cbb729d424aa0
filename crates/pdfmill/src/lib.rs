pub mod broadcast;
pub mod config;
pub mod error;
pub mod limiter;
pub mod notify;
pub mod pipeline;
pub mod registry;
pub mod sanitize;
pub mod service;
pub mod step;
pub mod storage;
pub mod worker;

pub use broadcast::{JobProgressBroadcaster, JobProgressEvent};
pub use config::{load_config, Config};
pub use error::{
    ConfigError, PdfmillError, QueryError, Result, StorageError, SubmitError, WorkerError,
};
pub use limiter::RateLimiter;
pub use notify::{EmailNotifier, JobOutcome, LogNotifier, Notifier};
pub use pipeline::{Dpi, PageSelection, Pipeline, PipelineContext, PipelineRequest};
pub use registry::{JobRecord, JobRegistry, JobState};
pub use service::{JobStatus, PdfService, SubmissionReceipt, SubmitOptions, Upload};
pub use storage::FileStorage;
pub use worker::WorkerPool;
