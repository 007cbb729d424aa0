use std::ffi::OsString;
use std::path::Path;

use tracing::warn;

use super::command::run_tool;
use super::{PipelineStep, StepOutcome};
use crate::pipeline::request::PipelineRequest;

/// Compresses the document. Runs last so it operates on the fully-processed
/// artifact. Non-mandatory.
pub struct CompressStep {
    program: String,
}

impl CompressStep {
    pub const SUFFIX: &'static str = "-compressed";

    /// Ghostscript-style quality preset passed to the tool.
    const QUALITY: &'static str = "ebook";

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PipelineStep for CompressStep {
    fn name(&self) -> &'static str {
        "compress"
    }

    fn note(&self) -> &'static str {
        "Compressing PDF..."
    }

    fn enabled(&self, request: &PipelineRequest) -> bool {
        request.compress
    }

    fn run(&self, input: &Path, _request: &PipelineRequest) -> StepOutcome {
        let args: Vec<OsString> = vec![input.as_os_str().to_os_string(), Self::QUALITY.into()];

        match run_tool(&self.program, &args, input, Self::SUFFIX) {
            Ok(Some(artifact)) => StepOutcome::Produced(artifact),
            Ok(None) => StepOutcome::Skipped,
            Err(detail) => {
                warn!(step = self.name(), detail, "optional step failed, continuing");
                StepOutcome::Skipped
            }
        }
    }
}
