use hubqueue_shared::{Context, ScanEntry, ScanVisitor, Usec, Verdict};

use crate::PruneMode;

/// Drops hub-queue entries while the hub cannot be reached.
///
/// The size limit is checked against a count taken once at the start of the
/// pass and lowered on every removal, so entries are dropped in visiting
/// order until the pass is back under the limit.
pub(crate) struct Pruner {
    mode: PruneMode,
    max_entries: usize,
    max_age: Usec,
    now: Usec,
    queued: usize,
    pub(crate) dropped: usize,
    pub(crate) stale: usize,
}

impl Pruner {
    pub fn new(mode: PruneMode, max_entries: usize, max_age: Usec, now: Usec, queued: usize) -> Self {
        Self {
            mode,
            max_entries,
            max_age,
            now,
            queued,
            dropped: 0,
            stale: 0,
        }
    }

    fn should_drop(&self, queued_at: Usec) -> bool {
        match self.mode {
            PruneMode::DropAll => true,
            PruneMode::Bounded => {
                self.queued > self.max_entries
                    || (self.now > queued_at && self.now - queued_at > self.max_age)
            }
        }
    }
}

impl<C: Context> ScanVisitor<C> for Pruner {
    fn visit(&mut self, entry: &ScanEntry<C>) -> Verdict {
        let Some(context) = entry.live() else {
            return Verdict::Remove;
        };

        if self.should_drop(context.queues().hub().queued_at()) {
            Verdict::Remove
        } else {
            Verdict::Keep
        }
    }

    fn after(&mut self, entry: ScanEntry<C>, removed: bool) {
        if !removed {
            return;
        }
        self.queued = self.queued.saturating_sub(1);
        self.dropped += 1;
        if entry.is_stale() {
            self.stale += 1;
        }
    }
}
