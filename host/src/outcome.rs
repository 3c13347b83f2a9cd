/// How the pruner decides what to drop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PruneMode {
    /// Drop every queued context, the host is unclaimed
    DropAll,
    /// Drop only what is over the size limit or too old
    Bounded,
}

impl PruneMode {
    pub fn name(self) -> &'static str {
        match self {
            PruneMode::DropAll => "drop all",
            PruneMode::Bounded => "bounded",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PruneOutcome {
    pub mode: PruneMode,
    pub visited: usize,
    pub dropped: usize,
    /// Dropped because the registry no longer maps the id to the queued context
    pub stale: usize,
    pub stopped: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PostProcessOutcome {
    pub visited: usize,
    pub processed: usize,
    /// Entries whose context no longer exists
    pub dropped: usize,
    pub stopped: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub visited: usize,
    /// Changed contexts, including hidden ones that produced no message
    pub dispatched: usize,
    /// Messages in the bundle that was sent
    pub messages: usize,
    pub unchanged: usize,
    /// Not due yet, left queued
    pub deferred: usize,
    /// Left queued because the registry maps the id elsewhere
    pub stale: usize,
    pub deleted: usize,
    pub sent: bool,
    pub stopped: bool,
}

/// What a cycle did with the hub queue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HubPass {
    Pruned(PruneOutcome),
    Empty,
    Dispatched(DispatchOutcome),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleOutcome {
    pub post_process: PostProcessOutcome,
    pub hub: HubPass,
}
