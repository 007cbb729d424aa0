pub mod context;
pub mod error;
pub mod progress;
pub mod request;
pub mod runner;

pub use context::PipelineContext;
pub use error::{PipelineError, PipelineWarning};
pub use progress::{NoopProgress, ProgressEvent, ProgressReporter, TrackingProgress};
pub use request::{Dpi, PageSelection, PipelineRequest};
pub use runner::Pipeline;
