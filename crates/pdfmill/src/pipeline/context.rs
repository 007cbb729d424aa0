use std::path::PathBuf;

use super::error::PipelineWarning;
use super::request::PipelineRequest;

pub struct PipelineContext {
    pub request: PipelineRequest,

    /// The artifact flowing between steps. Starts as the submitted input;
    /// each `Produced` outcome replaces it (discarding the previous
    /// intermediate, never the original input).
    pub current: PathBuf,

    /// Non-fatal observations (skipped optional steps).
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineContext {
    pub fn new(request: PipelineRequest) -> Self {
        let current = request.input_path.clone();
        Self {
            request,
            current,
            warnings: Vec::new(),
        }
    }
}
