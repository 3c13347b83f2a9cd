use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Lets at most one log line through per interval and counts the rest
pub struct LogLimiter {
    interval: Duration,
    state: Mutex<LimiterState>,
}

struct LimiterState {
    last_emitted: Option<Instant>,
    suppressed: usize,
}

impl LogLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Mutex::new(LimiterState {
                last_emitted: None,
                suppressed: 0,
            }),
        }
    }

    /// `Some(suppressed)` if a line may be emitted now, where `suppressed` is
    /// the number of lines held back since the previous one
    pub fn check(&self) -> Option<usize> {
        self.check_at(Instant::now())
    }

    fn check_at(&self, now: Instant) -> Option<usize> {
        let mut state = self.state.lock();
        let allowed = match state.last_emitted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };

        if !allowed {
            state.suppressed += 1;
            return None;
        }

        state.last_emitted = Some(now);
        Some(std::mem::take(&mut state.suppressed))
    }
}
