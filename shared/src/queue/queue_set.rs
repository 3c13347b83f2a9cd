use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Weak,
    },
};

use parking_lot::{Mutex, MutexGuard};

use crate::{Context, QueueError, QueueKind, SlotIndex, Usec};

/// Result of inserting a context into a `QueueSet`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueStatus {
    /// The context got a new slot
    Added,
    /// The context already had a slot, nothing changed structurally
    Found,
}

/// A queued entry: the context's id and a non-owning handle to it
pub struct QueueSlot<C> {
    id: Arc<str>,
    handle: Weak<C>,
}

impl<C> QueueSlot<C> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn handle(&self) -> &Weak<C> {
        &self.handle
    }

    /// Whether this slot refers to exactly `context`
    pub fn holds(&self, context: &Arc<C>) -> bool {
        std::ptr::eq(self.handle.as_ptr(), Arc::as_ptr(context))
    }

    pub fn same_target(&self, other: &QueueSlot<C>) -> bool {
        Weak::ptr_eq(&self.handle, &other.handle)
    }
}

impl<C> Clone for QueueSlot<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl<C> fmt::Debug for QueueSlot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueSlot")
            .field("id", &self.id)
            .field("alive", &(self.handle.strong_count() > 0))
            .finish()
    }
}

struct Slots<C> {
    next_id: SlotIndex,
    map: BTreeMap<SlotIndex, QueueSlot<C>>,
}

/// Ordered, sparse set of queued contexts.
///
/// Slots are keyed by a monotonically assigned index, so ascending order is
/// insertion order. `version` changes once per structural mutation and,
/// like `entries`, can be read without taking the lock.
pub struct QueueSet<C> {
    kind: QueueKind,
    slots: Mutex<Slots<C>>,
    version: AtomicU64,
    entries: AtomicUsize,
}

impl<C: Context> QueueSet<C> {
    pub fn new(kind: QueueKind) -> Self {
        Self {
            kind,
            slots: Mutex::new(Slots {
                next_id: 1,
                map: BTreeMap::new(),
            }),
            version: AtomicU64::new(0),
            entries: AtomicUsize::new(0),
        }
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.entries() == 0
    }

    pub fn lock(&self) -> QueueGuard<'_, C> {
        QueueGuard {
            queue: self,
            slots: self.slots.lock(),
        }
    }

    pub fn try_insert(&self, context: &Arc<C>) -> Result<QueueStatus, QueueError> {
        self.lock().try_insert(context)
    }

    pub fn insert(&self, context: &Arc<C>) -> QueueStatus {
        self.lock().insert(context)
    }

    pub fn remove(&self, context: &Arc<C>) -> bool {
        self.lock().remove(context)
    }

    pub fn enqueue(&self, context: &Arc<C>, now: Usec) -> QueueStatus {
        self.lock().enqueue(context, now)
    }

    pub fn dequeue(&self, context: &Arc<C>, now: Usec) -> bool {
        self.lock().dequeue(context, now)
    }

    pub fn contains(&self, context: &Arc<C>) -> bool {
        self.lock().contains(context)
    }
}

/// Exclusive access to a `QueueSet`. Slots yielded through it borrow the
/// guard and cannot outlive the lock.
pub struct QueueGuard<'q, C> {
    queue: &'q QueueSet<C>,
    slots: MutexGuard<'q, Slots<C>>,
}

impl<'q, C: Context> QueueGuard<'q, C> {
    pub fn kind(&self) -> QueueKind {
        self.queue.kind
    }

    /// Gives `context` a slot unless it already has one.
    ///
    /// # Errors
    /// `QueueError::SlotMismatch` if the context's membership points at a slot
    /// that does not hold it.
    pub fn try_insert(&mut self, context: &Arc<C>) -> Result<QueueStatus, QueueError> {
        let membership = context.queues().get(self.queue.kind);
        let index = membership.index();

        if index != 0 {
            return match self.slots.map.get(&index) {
                Some(slot) if slot.holds(context) => Ok(QueueStatus::Found),
                _ => Err(QueueError::SlotMismatch {
                    queue: self.queue.kind.name(),
                    index,
                    context_id: context.id().to_string(),
                }),
            };
        }

        let index = self.slots.next_id;
        self.slots.next_id += 1;
        self.slots.map.insert(
            index,
            QueueSlot {
                id: Arc::from(context.id()),
                handle: Arc::downgrade(context),
            },
        );
        membership.set_index(index);
        self.queue.version.fetch_add(1, Ordering::Relaxed);
        self.queue.entries.fetch_add(1, Ordering::Relaxed);

        Ok(QueueStatus::Added)
    }

    /// Gives `context` a slot unless it already has one.
    ///
    /// # Panics
    ///
    /// Panics if the queue structure is corrupted, see `try_insert`.
    pub fn insert(&mut self, context: &Arc<C>) -> QueueStatus {
        match self.try_insert(context) {
            Ok(status) => status,
            Err(error) => panic!("{}", error),
        }
    }

    /// Frees the context's slot if it still holds this context. The
    /// membership index is reset either way.
    pub fn remove(&mut self, context: &Arc<C>) -> bool {
        let membership = context.queues().get(self.queue.kind);
        let index = membership.index();

        let holds = self
            .slots
            .map
            .get(&index)
            .is_some_and(|slot| slot.holds(context));
        if holds {
            self.slots.map.remove(&index);
            self.queue.version.fetch_add(1, Ordering::Relaxed);
            self.queue.entries.fetch_sub(1, Ordering::Relaxed);
        }
        membership.set_index(0);

        holds
    }

    /// Inserts `context` and merges its current update reasons into its
    /// membership. Repeated enqueues never create a second slot.
    pub fn enqueue(&mut self, context: &Arc<C>, now: Usec) -> QueueStatus {
        let kind = self.queue.kind;
        let status = self.insert(context);

        let membership = context.queues().get(kind);
        let reasons = context.flags().get().reasons();
        context.flags().set(kind.queued_flag());

        match status {
            QueueStatus::Added => {
                membership.set_queued_at(now);
                membership.set_queued_flags(reasons);
            }
            QueueStatus::Found => {
                if kind == QueueKind::Hub {
                    membership.set_queued_at(now);
                }
                membership.or_queued_flags(reasons);
            }
        }

        status
    }

    /// Removes `context` and clears its queued flag. No-op if it was not queued.
    pub fn dequeue(&mut self, context: &Arc<C>, now: Usec) -> bool {
        let kind = self.queue.kind;
        if !self.remove(context) {
            return false;
        }

        context.flags().clear(kind.queued_flag());
        if kind == QueueKind::PostProcess {
            context.queues().get(kind).set_dequeued_at(now);
        }
        true
    }

    /// Frees the slot at `index` if it still refers to the same context as
    /// `expected`. Used for entries whose context no longer exists.
    pub fn remove_slot(&mut self, index: SlotIndex, expected: &QueueSlot<C>) -> bool {
        let matches = self
            .slots
            .map
            .get(&index)
            .is_some_and(|slot| slot.same_target(expected));
        if !matches {
            return false;
        }

        self.slots.map.remove(&index);
        self.queue.version.fetch_add(1, Ordering::Relaxed);
        self.queue.entries.fetch_sub(1, Ordering::Relaxed);
        true
    }

    pub fn contains(&self, context: &Arc<C>) -> bool {
        let index = context.queues().get(self.queue.kind).index();
        self.slots
            .map
            .get(&index)
            .is_some_and(|slot| slot.holds(context))
    }

    pub fn get(&self, index: SlotIndex) -> Option<&QueueSlot<C>> {
        self.slots.map.get(&index)
    }

    /// Populated slots in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &QueueSlot<C>)> + '_ {
        self.slots.map.iter().map(|(index, slot)| (*index, slot))
    }

    /// First populated slot after `cursor`, copied out so the lock can be dropped
    pub fn next_after(&self, cursor: SlotIndex) -> Option<(SlotIndex, QueueSlot<C>)> {
        self.slots
            .map
            .range((cursor + 1)..)
            .next()
            .map(|(index, slot)| (*index, slot.clone()))
    }

    /// Index the next inserted context will get
    pub fn next_index(&self) -> SlotIndex {
        self.slots.next_id
    }

    pub fn len(&self) -> usize {
        self.slots.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.map.is_empty()
    }
}
