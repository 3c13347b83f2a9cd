use parking_lot::Mutex;

use crate::{AtomicFlags, ContextQueues, ContextUpdate, Usec};

/// A metadata record whose changes are tracked by a host's queues.
///
/// The host's registry owns contexts; queues only keep weak handles and
/// re-resolve a context through the registry before touching it.
pub trait Context: Send + Sync + Sized + 'static {
    type Content: ContextContent;

    /// Key of this context in the registry
    fn id(&self) -> &str;

    /// Flag word: update reasons set by producers, queue bits set by the queues
    fn flags(&self) -> &AtomicFlags;

    fn queues(&self) -> &ContextQueues;

    /// The context's own lock. Never taken while a queue lock is held.
    fn content(&self) -> &Mutex<Self::Content>;
}

/// Lock-protected part of a context, everything the dispatcher needs
pub trait ContextContent: Send {
    /// Whether anything the hub sees differs from what it was last sent
    fn hub_version_changed(&mut self) -> bool;

    /// Called instead of `hub_update` when nothing changed: the version the
    /// hub holds is current
    fn mark_hub_current(&mut self);

    /// Gives the content its next version, remembers it as sent to the hub
    /// and builds the update message. Contexts the hub must not see return
    /// `None`; they are still considered dispatched.
    fn hub_update(&mut self, now: Usec) -> Option<ContextUpdate>;

    /// The version last sent to the hub
    fn hub_version(&self) -> u64;

    fn is_deleted(&self) -> bool;

    /// Hidden from the hub: dispatched like any other context but never
    /// sent, so its version is left out of the version hash
    fn is_hidden(&self) -> bool;

    /// Deleted and fully announced, may be removed for good
    fn should_be_deleted(&self) -> bool;

    /// Removes the persisted copy of this context
    fn delete_persisted(&mut self, id: &str);
}
