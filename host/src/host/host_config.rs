use std::{default::Default, time::Duration};

use hubqueue_shared::ReasonDelays;

/// Contains Config properties which will be used by a HostContexts
#[derive(Clone)]
pub struct HostConfig {
    /// While the hub is unreachable, queued updates beyond this count are
    /// dropped, earliest first
    pub max_offline_entries: usize,
    /// While the hub is unreachable, updates queued longer than this are dropped
    pub max_offline_age: Duration,
    /// Maximum number of contexts sent to the hub in one cycle
    pub messages_per_bundle: usize,
    /// Minimum time between two prune notices in the log
    pub prune_log_interval: Duration,
    /// How long a queued context waits before it may be sent, per update reason
    pub dispatch_delays: ReasonDelays,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_offline_entries: 10_000,
            max_offline_age: Duration::from_secs(15 * 60),
            messages_per_bundle: 100,
            prune_log_interval: Duration::from_secs(1),
            dispatch_delays: ReasonDelays::default(),
        }
    }
}
