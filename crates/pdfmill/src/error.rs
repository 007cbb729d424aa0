use std::path::PathBuf;
use thiserror::Error;

use crate::registry::JobState;

#[derive(Error, Debug)]
pub enum PdfmillError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Submission rejected: {0}")]
    Submit(#[from] SubmitError),

    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

/// Rejections surfaced synchronously at submission time. None of these
/// create a job record; only `RateLimited` consumes a rate-limit slot
/// (by definition the slot check itself).
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File is empty")]
    EmptyFile,

    #[error("File size {size} exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Invalid notification address: {0}")]
    InvalidNotifyTarget(String),

    #[error("Unsupported resolution: {0} dpi")]
    InvalidDpi(u32),

    #[error("Invalid page selection: {0}")]
    InvalidPageSelection(String),

    #[error("Too many submissions from this origin, try again later")]
    RateLimited,

    #[error("Processing queue is full, try again later")]
    QueueFull,

    #[error("Service is shutting down")]
    ShuttingDown,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors on the status/download read path.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid job id: {0}")]
    InvalidId(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job {id} is not ready: {state}")]
    NotReady { id: String, state: JobState },

    #[error("Result for job {id} is unavailable: {reason}")]
    ResultUnavailable { id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to resolve path '{path}': {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Path escapes the storage root: {0}")]
    PathEscape(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Worker queue is full")]
    QueueFull,
}

pub type Result<T> = std::result::Result<T, PdfmillError>;
