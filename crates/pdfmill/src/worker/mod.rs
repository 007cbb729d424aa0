pub mod job;
pub mod pool;

pub use job::JobResult;
pub use pool::WorkerPool;
