use std::time::Duration;

use crate::{duration_to_usec, Flags, Membership, Usec};

/// Decides the earliest time a queued context may be sent to the hub
pub trait DispatchPolicy: Send + Sync {
    fn dispatch_time(&self, membership: &Membership, now: Usec) -> Usec;
}

/// Dispatch delay per update reason. A context waits for the shortest delay
/// among the reasons it was queued for, counted from its last enqueue.
#[derive(Clone, Debug)]
pub struct ReasonDelays {
    delays: Vec<(Flags, Duration)>,
    fallback: Duration,
}

impl ReasonDelays {
    /// An empty table, every context waits `fallback`
    pub fn new(fallback: Duration) -> Self {
        Self {
            delays: Vec::new(),
            fallback,
        }
    }

    pub fn with_delay(mut self, reason: Flags, delay: Duration) -> Self {
        match self.delays.iter_mut().find(|(flag, _)| *flag == reason) {
            Some((_, existing)) => *existing = delay,
            None => self.delays.push((reason, delay)),
        }
        self
    }

    pub fn fallback(&self) -> Duration {
        self.fallback
    }

    pub fn delay_for(&self, flags: Flags) -> Duration {
        self.delays
            .iter()
            .filter(|(reason, _)| flags.intersects(*reason))
            .map(|(_, delay)| *delay)
            .min()
            .unwrap_or(self.fallback)
    }
}

impl Default for ReasonDelays {
    fn default() -> Self {
        let slow = Duration::from_secs(65);
        Self::new(Duration::from_secs(60))
            .with_delay(Flags::TRIGGERED, slow)
            .with_delay(Flags::NEW_OBJECT, slow)
            .with_delay(Flags::UPDATED_OBJECT, slow)
            .with_delay(Flags::LOAD_SQL, slow)
            .with_delay(Flags::CHANGED_METADATA, slow)
            .with_delay(Flags::ZERO_RETENTION, slow)
            .with_delay(Flags::CHANGED_FIRST_TIME, slow)
            .with_delay(Flags::CHANGED_LAST_TIME, Duration::from_secs(60))
            .with_delay(Flags::STOPPED_BEING_COLLECTED, slow)
            .with_delay(Flags::STARTED_BEING_COLLECTED, Duration::from_secs(5))
            .with_delay(Flags::UNUSED, Duration::from_secs(5))
            .with_delay(Flags::CHANGED_LINKING, slow)
            .with_delay(Flags::DISCONNECTED_CHILD, slow)
            .with_delay(Flags::DB_ROTATION, slow)
            .with_delay(Flags::UPDATE_RETENTION, slow)
    }
}

impl DispatchPolicy for ReasonDelays {
    fn dispatch_time(&self, membership: &Membership, now: Usec) -> Usec {
        if let Some(dispatch_at) = membership.cached_dispatch_at() {
            return dispatch_at;
        }

        let delay = duration_to_usec(&self.delay_for(membership.queued_flags()));
        let dispatch_at = membership.queued_at().saturating_add(delay);
        membership.cache_dispatch_at(now, dispatch_at);
        dispatch_at
    }
}

/// Every queued context is due immediately
#[derive(Clone, Copy, Debug, Default)]
pub struct Immediate;

impl DispatchPolicy for Immediate {
    fn dispatch_time(&self, _membership: &Membership, _now: Usec) -> Usec {
        0
    }
}
