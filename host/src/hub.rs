use std::sync::Arc;

use hubqueue_shared::{ClaimId, Context, ContextsUpdated};

use crate::HostContexts;

/// The host's connection to the hub, as far as the queues are concerned
pub trait HubLink: Send + Sync {
    /// The agent's claim, `None` while unclaimed
    fn claim_id(&self) -> Option<ClaimId>;

    /// Whether the hub can currently be reached
    fn is_online(&self) -> bool;

    /// Hands a finished bundle to the transport
    fn send_contexts_updated(&self, bundle: ContextsUpdated);
}

/// Work done on a context after it leaves the post-process queue.
/// May enqueue the context again.
pub trait PostProcess<C: Context>: Send + Sync {
    fn post_process(&self, host: &HostContexts<C>, context: &Arc<C>);
}

impl<C, F> PostProcess<C> for F
where
    C: Context,
    F: Fn(&HostContexts<C>, &Arc<C>) + Send + Sync,
{
    fn post_process(&self, host: &HostContexts<C>, context: &Arc<C>) {
        self(host, context)
    }
}
