//! Full-queue scans that touch contexts outside the queue lock.
//!
//! Every visited entry goes through the same cycle:
//! 1. under the queue lock, copy out the next slot after the cursor
//! 2. drop the queue lock
//! 3. resolve the slot through the registry and check identity
//! 4. let the visitor decide, with no queue lock held
//! 5. if the visitor wants the entry removed, re-lock and remove it only if
//!    the slot still holds the same context
//! 6. hand the entry back to the visitor outside the lock; the protective
//!    reference is released when the entry is dropped
//!
//! The running flag is checked before every entry and again before
//! committing a removal, so a scan can stop anywhere and leave the queue
//! consistent. Slots added after the scan started, including re-enqueues
//! made by the visitor, are left for the next scan. A visitor ends the scan
//! itself through `ScanVisitor::wants_more`, checked before the next slot is
//! resolved.

use std::sync::Arc;

use crate::{Context, QueueSet, QueueSlot, Registry, RunningFlag, SlotIndex, Usec};

/// What the registry said about a queued slot
pub enum ScanTarget<C> {
    /// The registry still maps the id to this context. Holds the protective
    /// reference.
    Live(Arc<C>),
    /// The context exists but the registry maps its id elsewhere, or not at all
    Stale(Arc<C>),
    /// The context has been destroyed
    Gone,
}

pub struct ScanEntry<C> {
    index: SlotIndex,
    slot: QueueSlot<C>,
    target: ScanTarget<C>,
}

impl<C> ScanEntry<C> {
    pub fn index(&self) -> SlotIndex {
        self.index
    }

    pub fn id(&self) -> &str {
        self.slot.id()
    }

    pub fn target(&self) -> &ScanTarget<C> {
        &self.target
    }

    /// The context, if its identity still holds
    pub fn live(&self) -> Option<&Arc<C>> {
        match &self.target {
            ScanTarget::Live(context) => Some(context),
            _ => None,
        }
    }

    /// Stale or gone
    pub fn is_stale(&self) -> bool {
        !matches!(self.target, ScanTarget::Live(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Leave the entry queued
    Keep,
    /// Remove the entry, if the slot still holds the same context
    Remove,
}

pub trait ScanVisitor<C: Context> {
    /// Checked before the next entry is resolved. Returning false ends the
    /// scan with the remaining entries untouched.
    fn wants_more(&self) -> bool {
        true
    }

    /// Decides what happens to `entry`. Runs with no queue lock held.
    fn visit(&mut self, entry: &ScanEntry<C>) -> Verdict;

    /// Runs after the verdict was applied, with no queue lock held.
    /// `removed` is true only if this scan took the entry off the queue.
    fn after(&mut self, _entry: ScanEntry<C>, _removed: bool) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub visited: usize,
    pub removed: usize,
    /// Ended by the visitor or by shutdown rather than by reaching the end
    pub stopped: bool,
}

/// Walks `queue` in index order, see the module docs for the protocol
pub fn protected_scan<C, R, V>(
    queue: &QueueSet<C>,
    registry: &R,
    running: &RunningFlag,
    now: Usec,
    visitor: &mut V,
) -> ScanOutcome
where
    C: Context,
    R: Registry<C> + ?Sized,
    V: ScanVisitor<C>,
{
    let mut outcome = ScanOutcome::default();
    let mut cursor: SlotIndex = 0;
    let end = queue.lock().next_index();

    loop {
        if !running.is_running() {
            outcome.stopped = true;
            break;
        }

        let Some((index, slot)) = queue.lock().next_after(cursor) else {
            break;
        };
        if index >= end {
            break;
        }
        if !visitor.wants_more() {
            outcome.stopped = true;
            break;
        }
        cursor = index;

        let target = resolve(registry, &slot);
        let entry = ScanEntry {
            index,
            slot,
            target,
        };
        outcome.visited += 1;

        let removed = match visitor.visit(&entry) {
            Verdict::Keep => false,
            Verdict::Remove => {
                let mut guard = queue.lock();
                if !running.is_running() {
                    drop(guard);
                    outcome.stopped = true;
                    visitor.after(entry, false);
                    break;
                }

                let still_there = guard
                    .get(index)
                    .is_some_and(|current| current.same_target(&entry.slot));
                match &entry.target {
                    _ if !still_there => false,
                    ScanTarget::Live(context) | ScanTarget::Stale(context) => {
                        guard.dequeue(context, now)
                    }
                    ScanTarget::Gone => guard.remove_slot(index, &entry.slot),
                }
            }
        };

        if removed {
            outcome.removed += 1;
        }
        visitor.after(entry, removed);
    }

    outcome
}

fn resolve<C, R>(registry: &R, slot: &QueueSlot<C>) -> ScanTarget<C>
where
    C: Context,
    R: Registry<C> + ?Sized,
{
    let Some(context) = slot.handle().upgrade() else {
        return ScanTarget::Gone;
    };

    match registry.acquire(slot.id()) {
        Some(current) if Arc::ptr_eq(&current, &context) => ScanTarget::Live(current),
        _ => ScanTarget::Stale(context),
    }
}
