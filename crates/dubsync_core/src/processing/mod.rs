//! Per-clip processing and the worker pool that runs it.

mod pool;
mod processor;

pub use pool::{resolve_workers, WorkerPool};
pub use processor::ClipProcessor;
