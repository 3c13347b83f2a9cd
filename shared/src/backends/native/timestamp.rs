use std::time::SystemTime;

use thiserror::Error;

use crate::types::{Usec, USEC_PER_SEC};

/// Error type for timestamp operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    /// System time is before UNIX epoch
    #[error("System time is before UNIX epoch")]
    SystemTimeBeforeEpoch,
}

pub struct Timestamp;

impl Timestamp {
    /// Returns the current wall-clock time in microseconds since UNIX epoch.
    ///
    /// # Errors
    /// Returns `TimeError::SystemTimeBeforeEpoch` if system time is before UNIX epoch.
    pub fn try_now_usec() -> Result<Usec, TimeError> {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_micros()).unwrap_or(Usec::MAX))
            .map_err(|_| TimeError::SystemTimeBeforeEpoch)
    }

    /// Returns the current wall-clock time in microseconds since UNIX epoch,
    /// or 0 when the system clock is set before the epoch.
    pub fn now_usec() -> Usec {
        Self::try_now_usec().unwrap_or(0)
    }

    /// Whole seconds of a microsecond timestamp
    pub fn usec_to_secs(usec: Usec) -> u64 {
        usec / USEC_PER_SEC
    }
}
