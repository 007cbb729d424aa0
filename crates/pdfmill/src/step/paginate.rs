use std::path::Path;

use tracing::warn;

use super::command::run_tool;
use super::{PipelineStep, StepOutcome};
use crate::pipeline::request::PipelineRequest;

/// Stamps page numbers onto the document. Non-mandatory.
pub struct PaginateStep {
    program: String,
}

impl PaginateStep {
    pub const SUFFIX: &'static str = "-numbered";

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PipelineStep for PaginateStep {
    fn name(&self) -> &'static str {
        "add_page_numbers"
    }

    fn note(&self) -> &'static str {
        "Adding page numbers..."
    }

    fn enabled(&self, request: &PipelineRequest) -> bool {
        request.add_page_numbers
    }

    fn run(&self, input: &Path, _request: &PipelineRequest) -> StepOutcome {
        match run_tool(
            &self.program,
            &[input.as_os_str().to_os_string()],
            input,
            Self::SUFFIX,
        ) {
            Ok(Some(artifact)) => StepOutcome::Produced(artifact),
            Ok(None) => StepOutcome::Skipped,
            Err(detail) => {
                warn!(step = self.name(), detail, "optional step failed, continuing");
                StepOutcome::Skipped
            }
        }
    }
}
