use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::Context;

/// Authoritative owner of a host's contexts, keyed by context id.
///
/// A returned `Arc` is the protective reference: the context cannot be
/// destroyed while it is held. Dropping it releases the protection.
pub trait Registry<C: Context>: Send + Sync {
    fn acquire(&self, id: &str) -> Option<Arc<C>>;

    /// Returns false if nothing was registered under `id`
    fn delete(&self, id: &str) -> bool;

    /// Removes `context` only if its id still maps to it, in one step.
    /// Returns false, leaving the registry untouched, if the id is unmapped
    /// or maps to another context.
    fn delete_current(&self, context: &Arc<C>) -> bool;

    /// Visits every registered context. No registry lock is held while
    /// `visit` runs.
    fn for_each(&self, visit: &mut dyn FnMut(&Arc<C>));

    /// Whether `context` is still what the registry maps its id to
    fn is_current(&self, context: &Arc<C>) -> bool {
        self.acquire(context.id())
            .is_some_and(|current| Arc::ptr_eq(&current, context))
    }
}

/// In-memory `Registry` backed by a hash map
pub struct MemoryRegistry<C> {
    contexts: RwLock<HashMap<String, Arc<C>>>,
}

impl<C: Context> MemoryRegistry<C> {
    pub fn new() -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `context`, returning whatever was mapped to its id before
    pub fn insert(&self, context: Arc<C>) -> Option<Arc<C>> {
        let id = context.id().to_string();
        self.contexts.write().insert(id, context)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.contexts.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.contexts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.read().is_empty()
    }
}

impl<C: Context> Default for MemoryRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Context> Registry<C> for MemoryRegistry<C> {
    fn acquire(&self, id: &str) -> Option<Arc<C>> {
        self.contexts.read().get(id).cloned()
    }

    fn delete(&self, id: &str) -> bool {
        self.contexts.write().remove(id).is_some()
    }

    fn delete_current(&self, context: &Arc<C>) -> bool {
        let mut contexts = self.contexts.write();
        match contexts.get(context.id()) {
            Some(current) if Arc::ptr_eq(current, context) => {
                contexts.remove(context.id());
                true
            }
            _ => false,
        }
    }

    fn for_each(&self, visit: &mut dyn FnMut(&Arc<C>)) {
        let contexts: Vec<Arc<C>> = self.contexts.read().values().cloned().collect();
        for context in &contexts {
            visit(context);
        }
    }
}
