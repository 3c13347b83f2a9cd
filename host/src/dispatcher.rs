use log::error;

use hubqueue_shared::{
    ClaimId, Context, ContextContent, ContextsUpdated, NodeId, ScanEntry, ScanTarget, ScanVisitor,
    Usec, Verdict,
};

use crate::{DispatchOutcome, HostContexts};

/// Drains due hub-queue entries into one bundle, up to the configured
/// number of dispatched contexts
pub(crate) struct Dispatcher<'h, C: Context> {
    host: &'h HostContexts<C>,
    claim_id: ClaimId,
    node_id: NodeId,
    now: Usec,
    limit: usize,
    bundle: Option<ContextsUpdated>,
    outcome: DispatchOutcome,
}

impl<'h, C: Context> Dispatcher<'h, C> {
    pub fn new(host: &'h HostContexts<C>, claim_id: ClaimId, node_id: NodeId, now: Usec) -> Self {
        Self {
            host,
            claim_id,
            node_id,
            now,
            limit: host.config().messages_per_bundle,
            bundle: None,
            outcome: DispatchOutcome::default(),
        }
    }

    pub fn finish(self) -> (Option<ContextsUpdated>, DispatchOutcome) {
        (self.bundle, self.outcome)
    }

    fn bundle(&mut self) -> &mut ContextsUpdated {
        let (claim_id, node_id, now) = (&self.claim_id, self.node_id, self.now);
        self.bundle
            .get_or_insert_with(|| ContextsUpdated::new(claim_id.clone(), node_id, 0, now))
    }
}

impl<C: Context> ScanVisitor<C> for Dispatcher<'_, C> {
    fn wants_more(&self) -> bool {
        self.outcome.dispatched < self.limit
    }

    fn visit(&mut self, entry: &ScanEntry<C>) -> Verdict {
        let context = match entry.target() {
            ScanTarget::Live(context) => context,
            ScanTarget::Stale(_) => {
                self.outcome.stale += 1;
                return Verdict::Keep;
            }
            ScanTarget::Gone => return Verdict::Remove,
        };

        let membership = context.queues().hub();
        if self.now < self.host.dispatch_policy().dispatch_time(membership, self.now) {
            self.outcome.deferred += 1;
            return Verdict::Keep;
        }

        let mut content = context.content().lock();
        if content.hub_version_changed() {
            self.bundle();
            if let Some(update) = content.hub_update(self.now) {
                self.bundle().push(update);
            }
            membership.record_dispatch(self.now);
            self.outcome.dispatched += 1;
        } else {
            content.mark_hub_current();
            self.outcome.unchanged += 1;
        }

        if content.should_be_deleted() {
            // record lock, then post-process queue lock
            self.host.post_process_queue().dequeue(context, self.now);
            content.delete_persisted(context.id());
            drop(content);

            if !self.host.registry().delete_current(context) {
                error!(
                    "host '{}' deleted context '{}' but the registry no longer maps it",
                    self.host.hostname(),
                    context.id()
                );
            }
            self.outcome.deleted += 1;
        }

        Verdict::Remove
    }
}
