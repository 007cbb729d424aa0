use std::ffi::OsString;
use std::path::Path;

use tracing::warn;

use super::command::run_tool;
use super::{PipelineStep, StepOutcome};
use crate::pipeline::request::PipelineRequest;

/// Full-document OCR and text indexing. Non-mandatory.
pub struct OcrStep {
    program: String,
}

impl OcrStep {
    pub const SUFFIX: &'static str = "-OCR";

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PipelineStep for OcrStep {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn note(&self) -> &'static str {
        "Running OCR..."
    }

    fn enabled(&self, request: &PipelineRequest) -> bool {
        request.run_ocr
    }

    fn run(&self, input: &Path, _request: &PipelineRequest) -> StepOutcome {
        let args: Vec<OsString> = vec![input.as_os_str().to_os_string(), "--full-ocr".into()];

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
