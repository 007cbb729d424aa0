use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{step} failed: {detail}")]
    StepFailed { step: &'static str, detail: String },

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),
}

#[derive(Debug, Clone)]
pub enum PipelineWarning {
    StepSkipped { step: &'static str },
}
