mod context_worker;
mod worker_config;

pub use context_worker::{ContextWorker, WorkerHandle};
pub use worker_config::WorkerConfig;
