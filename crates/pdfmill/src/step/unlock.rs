use std::path::Path;

use tracing::warn;

use super::command::run_tool;
use super::{PipelineStep, StepOutcome};
use crate::pipeline::request::PipelineRequest;

/// Removes security restrictions from the source document. Runs first so
/// later steps do not fail on an encrypted input. Non-mandatory: if the tool
/// fails the pipeline continues with the prior artifact.
pub struct UnlockStep {
    program: String,
}

impl UnlockStep {
    pub const SUFFIX: &'static str = "-unlocked";

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PipelineStep for UnlockStep {
    fn name(&self) -> &'static str {
        "remove_security"
    }

    fn note(&self) -> &'static str {
        "Removing security restrictions..."
    }

    fn enabled(&self, request: &PipelineRequest) -> bool {
        request.remove_security
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
