use std::ffi::OsString;
use std::path::Path;

use super::command::run_tool;
use super::{PipelineStep, StepOutcome};
use crate::pipeline::request::PipelineRequest;

/// Font and image normalization — the mandatory main processing step. The
/// only step whose failure ends the job.
pub struct NormalizeStep {
    program: String,
}

impl NormalizeStep {
    pub const SUFFIX: &'static str = "-FIXED";

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PipelineStep for NormalizeStep {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn note(&self) -> &'static str {
        "Converting PDF pages to high-resolution images..."
    }

    fn enabled(&self, _request: &PipelineRequest) -> bool {
        true
    }

    fn run(&self, input: &Path, request: &PipelineRequest) -> StepOutcome {
        let args: Vec<OsString> = vec![
            input.as_os_str().to_os_string(),
            "--dpi".into(),
            request.dpi.as_u32().to_string().into(),
            "--pages".into(),
            request.pages.to_tool_arg().into(),
        ];

        match run_tool(&self.program, &args, input, Self::SUFFIX) {
            Ok(Some(artifact)) => StepOutcome::Produced(artifact),
            // Some tool versions write straight to the requested output path
            // instead of the suffix convention.
            Ok(None) if request.output_path.exists() => {
                StepOutcome::Produced(request.output_path.clone())
            }
            Ok(None) => StepOutcome::Fatal("output file was not created".to_string()),
            Err(detail) => StepOutcome::Fatal(detail),
        }
    }
}
