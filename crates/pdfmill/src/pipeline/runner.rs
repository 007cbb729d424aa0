use std::path::Path;

use tracing::{debug, info_span, warn};

use crate::config::ToolsConfig;
use crate::sanitize;
use crate::step::{
    CompressStep, NormalizeStep, OcrStep, PaginateStep, PipelineStep, StepOutcome, UnlockStep,
};
use crate::storage::FileStorage;
use crate::worker::job::JobResult;

use super::context::PipelineContext;
use super::error::{PipelineError, PipelineWarning};
use super::progress::{ProgressEvent, ProgressReporter};

/// Ordered step executor for a single job.
///
/// Steps run in a fixed order; each enabled step reads the current working
/// file and may replace it. Optional steps that fail leave the working file
/// untouched and the run continues; a fatal step aborts the run.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    storage: FileStorage,
}

impl Pipeline {
    /// Production constructor — builds the full step sequence from config.
    pub fn from_config(tools: &ToolsConfig, storage: FileStorage) -> Self {
        let steps: Vec<Box<dyn PipelineStep>> = vec![
            Box::new(UnlockStep::new(&tools.unlock)),
            Box::new(NormalizeStep::new(&tools.normalize)),
            Box::new(OcrStep::new(&tools.ocr)),
            Box::new(PaginateStep::new(&tools.paginate)),
            Box::new(CompressStep::new(&tools.compress)),
        ];
        Self { steps, storage }
    }

    /// Test constructor — inject a specific step sequence.
    #[cfg(test)]
    pub fn with_steps(steps: Vec<Box<dyn PipelineStep>>, storage: FileStorage) -> Self {
        Self { steps, storage }
    }

    /// Run every enabled step for a single job.
    /// Returns a (JobResult, PipelineContext) pair. The uploaded input file
    /// is deleted before this returns, on both the success and failure path.
    pub fn run(
        &self,
        mut ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> (JobResult, PipelineContext) {
        let filename = sanitize::redact_path(&ctx.request.input_path);
        let _pipeline_span = info_span!("pipeline",
            job_id = %ctx.request.job_id,
            filename = %filename,
        )
        .entered();

        if let Err(e) = self.run_steps(&mut ctx, progress) {
            let err_msg = e.to_string();
            self.discard_intermediate(&ctx);
            self.cleanup_input(&ctx.request.input_path);
            progress.report(ProgressEvent::Failed {
                error: err_msg.clone(),
            });
            return (JobResult::failure(&ctx.request, err_msg), ctx);
        }

        {
            let _step = info_span!("store_result").entered();
            progress.report(ProgressEvent::Note {
                message: "Storing result...".to_string(),
            });
            if let Err(e) = self
                .storage
                .promote(&ctx.current, &ctx.request.output_path)
            {
                let err_msg = PipelineError::from(e).to_string();
                self.discard_intermediate(&ctx);
                self.cleanup_input(&ctx.request.input_path);
                progress.report(ProgressEvent::Failed {
                    error: err_msg.clone(),
                });
                return (JobResult::failure(&ctx.request, err_msg), ctx);
            }
        }

        self.cleanup_input(&ctx.request.input_path);
        progress.report(ProgressEvent::Completed {
            result_path: ctx.request.output_path.clone(),
        });
        let result = JobResult::success(&ctx.request, ctx.request.output_path.clone());
        (result, ctx)
    }

    fn run_steps(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        for step in &self.steps {
            if !step.enabled(&ctx.request) {
                debug!(step = step.name(), "step disabled for this job");
                continue;
            }

            let _step_span = info_span!("step", name = step.name()).entered();
            progress.report(ProgressEvent::Note {
                message: step.note().to_string(),
            });

            match step.run(&ctx.current, &ctx.request) {
                StepOutcome::Produced(path) => {
                    // The previous intermediate is no longer needed; the
                    // original upload is kept until the run finishes.
                    if ctx.current != ctx.request.input_path {
                        if let Err(e) = self.storage.remove(&ctx.current) {
                            warn!(step = step.name(), error = %e, "failed to remove intermediate");
                        }
                    }
                    ctx.current = path;
                }
                StepOutcome::Skipped => {
                    warn!(step = step.name(), "step skipped, continuing with previous file");
                    ctx.warnings
                        .push(PipelineWarning::StepSkipped { step: step.name() });
                }
                StepOutcome::Fatal(detail) => {
                    return Err(PipelineError::StepFailed {
                        step: step.name(),
                        detail,
                    });
                }
            }
        }
        Ok(())
    }

    /// Remove the current working file if it is a step product (never the upload).
    fn discard_intermediate(&self, ctx: &PipelineContext) {
        if ctx.current != ctx.request.input_path && ctx.current.exists() {
            if let Err(e) = self.storage.remove(&ctx.current) {
                warn!(error = %e, "failed to remove intermediate after abort");
            }
        }
    }

    fn cleanup_input(&self, input: &Path) {
        if input.exists() {
            if let Err(e) = self.storage.remove(input) {
                warn!(
                    filename = %sanitize::redact_path(input),
                    error = %e,
                    "failed to remove uploaded input"
                );
            }
        }
    }
}
