use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by a ContextWorker
#[derive(Clone)]
pub struct WorkerConfig {
    /// Time between the starts of two cycles
    pub heartbeat: Duration,
    /// Name of the spawned thread
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_secs(1),
            thread_name: "ctx-worker".to_string(),
        }
    }
}
