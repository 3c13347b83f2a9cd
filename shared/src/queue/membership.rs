use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::{Flags, SlotIndex, Usec};

/// Which of a host's two queues a `QueueSet` is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Contexts with changes waiting to be dispatched to the hub
    Hub,
    /// Contexts waiting for a local post-processing pass
    PostProcess,
}

impl QueueKind {
    /// The flag a context carries while it sits in this queue
    pub fn queued_flag(self) -> Flags {
        match self {
            QueueKind::Hub => Flags::QUEUED_FOR_HUB,
            QueueKind::PostProcess => Flags::QUEUED_FOR_PP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QueueKind::Hub => "hub",
            QueueKind::PostProcess => "post-process",
        }
    }
}

/// Bookkeeping a context keeps for one queue.
///
/// `index` and the enqueue stamps are only written while the owning queue's
/// lock is held; the dispatch counters are written by the single dispatcher.
/// Every field is an atomic so it can be read for diagnostics at any time.
#[derive(Debug, Default)]
pub struct Membership {
    index: AtomicU64,
    queued_at: AtomicU64,
    queued_flags: AtomicU32,
    dequeued_at: AtomicU64,
    dispatches: AtomicU64,
    scheduled_dispatch_at: AtomicU64,
    delay_calculated_at: AtomicU64,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current slot in the queue, 0 when not queued
    pub fn index(&self) -> SlotIndex {
        self.index.load(Ordering::Relaxed)
    }

    pub fn is_queued(&self) -> bool {
        self.index() != 0
    }

    pub fn queued_at(&self) -> Usec {
        self.queued_at.load(Ordering::Relaxed)
    }

    /// Union of every update reason seen since the context was last taken off the queue
    pub fn queued_flags(&self) -> Flags {
        Flags::from_bits(self.queued_flags.load(Ordering::Relaxed))
    }

    pub fn dequeued_at(&self) -> Usec {
        self.dequeued_at.load(Ordering::Relaxed)
    }

    /// How many times this context was sent to the hub
    pub fn dispatches(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    pub fn scheduled_dispatch_at(&self) -> Usec {
        self.scheduled_dispatch_at.load(Ordering::Relaxed)
    }

    /// The dispatch time computed since the last enqueue, if any
    pub fn cached_dispatch_at(&self) -> Option<Usec> {
        let calculated_at = self.delay_calculated_at.load(Ordering::Relaxed);
        if calculated_at != 0 && calculated_at >= self.queued_at() {
            return Some(self.scheduled_dispatch_at());
        }
        None
    }

    pub fn cache_dispatch_at(&self, now: Usec, dispatch_at: Usec) {
        self.scheduled_dispatch_at.store(dispatch_at, Ordering::Relaxed);
        self.delay_calculated_at.store(now, Ordering::Relaxed);
    }

    /// Marks one message sent to the hub
    pub fn record_dispatch(&self, now: Usec) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        self.dequeued_at.store(now, Ordering::Relaxed);
    }

    pub fn info(&self) -> MembershipInfo {
        MembershipInfo {
            index: self.index(),
            queued_at: self.queued_at(),
            queued_flags: self.queued_flags(),
            dequeued_at: self.dequeued_at(),
            dispatches: self.dispatches(),
            scheduled_dispatch_at: self.scheduled_dispatch_at(),
        }
    }

    // Queue-lock holders only

    pub(crate) fn set_index(&self, index: SlotIndex) {
        self.index.store(index, Ordering::Relaxed);
    }

    pub(crate) fn set_queued_at(&self, now: Usec) {
        self.queued_at.store(now, Ordering::Relaxed);
    }

    pub(crate) fn set_queued_flags(&self, flags: Flags) {
        self.queued_flags.store(flags.bits(), Ordering::Relaxed);
    }

    pub(crate) fn or_queued_flags(&self, flags: Flags) {
        self.queued_flags.fetch_or(flags.bits(), Ordering::Relaxed);
    }

    pub(crate) fn set_dequeued_at(&self, now: Usec) {
        self.dequeued_at.store(now, Ordering::Relaxed);
    }
}

/// Point-in-time copy of a `Membership`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MembershipInfo {
    pub index: SlotIndex,
    pub queued_at: Usec,
    pub queued_flags: Flags,
    pub dequeued_at: Usec,
    pub dispatches: u64,
    pub scheduled_dispatch_at: Usec,
}

/// A context's memberships in both of its host's queues
#[derive(Debug, Default)]
pub struct ContextQueues {
    hub: Membership,
    post_process: Membership,
}

impl ContextQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hub(&self) -> &Membership {
        &self.hub
    }

    pub fn post_process(&self) -> &Membership {
        &self.post_process
    }

    pub fn get(&self, kind: QueueKind) -> &Membership {
        match kind {
            QueueKind::Hub => &self.hub,
            QueueKind::PostProcess => &self.post_process,
        }
    }
}
