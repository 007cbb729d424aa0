//! One external transformation stage in the fixed pipeline order.

pub mod command;
pub mod compress;
pub mod normalize;
pub mod ocr;
pub mod paginate;
pub mod unlock;

use std::path::{Path, PathBuf};

use crate::pipeline::request::PipelineRequest;

pub use compress::CompressStep;
pub use normalize::NormalizeStep;
pub use ocr::OcrStep;
pub use paginate::PaginateStep;
pub use unlock::UnlockStep;

/// Result of running one step against the current artifact.
#[derive(Debug)]
pub enum StepOutcome {
    /// The step yielded a new artifact; the pipeline continues with it and
    /// discards the previous intermediate (never the original input).
    Produced(PathBuf),
    /// No new artifact — either nothing to do, or a non-mandatory step
    /// failed. The pipeline continues with the current artifact.
    Skipped,
    /// A mandatory step failed; the whole job is aborted with this detail.
    Fatal(String),
}

pub trait PipelineStep: Send + Sync {
    fn name(&self) -> &'static str;

    /// Progress note shown to status pollers while this step runs.
    fn note(&self) -> &'static str;

    /// Whether the request enables this step.
    fn enabled(&self, request: &PipelineRequest) -> bool;

    fn run(&self, input: &Path, request: &PipelineRequest) -> StepOutcome;
}
