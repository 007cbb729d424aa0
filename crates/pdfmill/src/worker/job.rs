use std::path::PathBuf;

use crate::pipeline::PipelineRequest;

/// Final outcome of one pipeline run, handed back from the worker thread.
#[derive(Debug)]
pub struct JobResult {
    pub job_id: String,
    pub success: bool,
    pub result_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl JobResult {
    pub fn success(request: &PipelineRequest, result_path: PathBuf) -> Self {
        Self {
            job_id: request.job_id.clone(),
            success: true,
            result_path: Some(result_path),
            error: None,
        }
    }

    pub fn failure(request: &PipelineRequest, error: String) -> Self {
        Self {
            job_id: request.job_id.clone(),
            success: false,
            result_path: None,
            error: Some(error),
        }
    }
}
