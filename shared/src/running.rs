use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Process-wide "keep going" switch polled by every scan at entry boundaries
#[derive(Clone, Debug)]
pub struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Whether both handles switch the same flag
    pub fn same_as(&self, other: &RunningFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for RunningFlag {
    fn default() -> Self {
        Self::new()
    }
}
