use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::info;
use parking_lot::RwLock;

use hubqueue_shared::{
    duration_to_usec, protected_scan, ClaimId, Context, ContextContent, DispatchPolicy,
    LogLimiter, NodeId, QueueKind, QueueSet, QueueStatus, Registry, RunningFlag, Usec,
};

use crate::{
    dispatcher::Dispatcher, post_processor::PostProcessor, pruner::Pruner, CycleOutcome,
    DispatchOutcome, HostConfig, HubLink, HubPass, PostProcess, PostProcessOutcome, PruneMode,
    PruneOutcome,
};

/// A monitored host's context queues: contexts with changes waiting to be
/// sent to the hub, and contexts waiting for local post-processing.
///
/// Producers queue contexts from any thread. A single caller drives
/// `run_cycle` periodically.
pub struct HostContexts<C: Context> {
    hostname: String,
    config: HostConfig,
    // Collaborators
    registry: Arc<dyn Registry<C>>,
    hub: Arc<dyn HubLink>,
    post_process: Box<dyn PostProcess<C>>,
    dispatch_policy: Box<dyn DispatchPolicy>,
    running: RunningFlag,
    // Queues
    hub_queue: QueueSet<C>,
    pp_queue: QueueSet<C>,
    // Streaming state
    node_id: RwLock<Option<NodeId>>,
    stream_contexts: AtomicBool,
    prune_log: LogLimiter,
}

impl<C: Context> HostContexts<C> {
    /// Create a new HostContexts
    pub fn new<P: PostProcess<C> + 'static>(
        hostname: &str,
        config: HostConfig,
        registry: Arc<dyn Registry<C>>,
        hub: Arc<dyn HubLink>,
        post_process: P,
    ) -> Self {
        let dispatch_policy = Box::new(config.dispatch_delays.clone());
        let prune_log = LogLimiter::new(config.prune_log_interval);

        Self {
            hostname: hostname.to_string(),
            config,
            registry,
            hub,
            post_process: Box::new(post_process),
            dispatch_policy,
            running: RunningFlag::new(),
            hub_queue: QueueSet::new(QueueKind::Hub),
            pp_queue: QueueSet::new(QueueKind::PostProcess),
            node_id: RwLock::new(None),
            stream_contexts: AtomicBool::new(false),
            prune_log,
        }
    }

    /// Replaces the per-reason delays from the config
    pub fn with_dispatch_policy<D: DispatchPolicy + 'static>(mut self, policy: D) -> Self {
        self.dispatch_policy = Box::new(policy);
        self
    }

    /// Shares a running flag, so one `stop()` halts every host using it
    pub fn with_running_flag(mut self, running: RunningFlag) -> Self {
        self.running = running;
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn registry(&self) -> &dyn Registry<C> {
        self.registry.as_ref()
    }

    pub fn running(&self) -> &RunningFlag {
        &self.running
    }

    pub fn hub_queue(&self) -> &QueueSet<C> {
        &self.hub_queue
    }

    pub fn post_process_queue(&self) -> &QueueSet<C> {
        &self.pp_queue
    }

    pub(crate) fn post_processor(&self) -> &dyn PostProcess<C> {
        self.post_process.as_ref()
    }

    pub(crate) fn dispatch_policy(&self) -> &dyn DispatchPolicy {
        self.dispatch_policy.as_ref()
    }

    // Streaming state

    /// Sets the identity the hub assigned to this host. The zero id clears it.
    pub fn set_node_id(&self, node_id: NodeId) {
        *self.node_id.write() = if node_id.is_zero() { None } else { Some(node_id) };
    }

    pub fn node_id(&self) -> Option<NodeId> {
        *self.node_id.read()
    }

    pub fn enable_context_streaming(&self, enabled: bool) {
        self.stream_contexts.store(enabled, Ordering::Release);
    }

    pub fn streams_contexts(&self) -> bool {
        self.stream_contexts.load(Ordering::Acquire)
    }

    // Enqueue / Dequeue

    /// Queues `context` for dispatch to the hub, merging its current update
    /// reasons. Returns `None` and does nothing while the host is unclaimed.
    pub fn queue_for_hub(&self, context: &Arc<C>, now: Usec) -> Option<QueueStatus> {
        self.hub.claim_id()?;
        Some(self.hub_queue.enqueue(context, now))
    }

    pub fn queue_for_post_processing(&self, context: &Arc<C>, now: Usec) -> QueueStatus {
        self.pp_queue.enqueue(context, now)
    }

    pub fn dequeue_from_hub(&self, context: &Arc<C>, now: Usec) -> bool {
        self.hub_queue.dequeue(context, now)
    }

    pub fn dequeue_from_post_processing(&self, context: &Arc<C>, now: Usec) -> bool {
        self.pp_queue.dequeue(context, now)
    }

    /// Takes `context` off both queues. Returns true if it was queued anywhere.
    pub fn forget(&self, context: &Arc<C>, now: Usec) -> bool {
        let from_hub = self.hub_queue.dequeue(context, now);
        let from_pp = self.pp_queue.dequeue(context, now);
        from_hub || from_pp
    }

    /// Wrapping sum of the version last sent to the hub, over every context
    /// in the registry the hub can see: neither deleted nor hidden
    pub fn version_hash(&self) -> u64 {
        let mut hash: u64 = 0;
        self.registry.for_each(&mut |context: &Arc<C>| {
            let content = context.content().lock();
            if !content.is_deleted() && !content.is_hidden() {
                hash = hash.wrapping_add(content.hub_version());
            }
        });
        hash
    }

    // Cycle

    /// Runs the post-processor, then either prunes or dispatches the hub
    /// queue depending on the host's claim and connectivity
    pub fn run_cycle(&self, now: Usec) -> CycleOutcome {
        let post_process = self.post_process(now);
        let hub = self.dispatch_to_hub(now);
        CycleOutcome { post_process, hub }
    }

    pub fn dispatch_to_hub(&self, now: Usec) -> HubPass {
        let Some(claim_id) = self.hub.claim_id() else {
            return HubPass::Pruned(self.prune_hub_queue(PruneMode::DropAll, now));
        };

        let node_id = match self.node_id() {
            Some(node_id) if self.streams_contexts() && self.hub.is_online() => node_id,
            _ => return HubPass::Pruned(self.prune_hub_queue(PruneMode::Bounded, now)),
        };

        if self.hub_queue.is_empty() {
            return HubPass::Empty;
        }

        HubPass::Dispatched(self.dispatch(claim_id, node_id, now))
    }

    pub fn prune_hub_queue(&self, mode: PruneMode, now: Usec) -> PruneOutcome {
        let mut pruner = Pruner::new(
            mode,
            self.config.max_offline_entries,
            duration_to_usec(&self.config.max_offline_age),
            now,
            self.hub_queue.entries(),
        );
        let scan = protected_scan(
            &self.hub_queue,
            self.registry.as_ref(),
            &self.running,
            now,
            &mut pruner,
        );

        if pruner.dropped > 0 {
            if let Some(suppressed) = self.prune_log.check() {
                info!(
                    "host '{}' pruned {} queued context updates ({} stale, mode: {}, {} similar notices suppressed)",
                    self.hostname,
                    pruner.dropped,
                    pruner.stale,
                    mode.name(),
                    suppressed
                );
            }
        }

        PruneOutcome {
            mode,
            visited: scan.visited,
            dropped: pruner.dropped,
            stale: pruner.stale,
            stopped: scan.stopped,
        }
    }

    pub fn post_process(&self, now: Usec) -> PostProcessOutcome {
        let mut processor = PostProcessor::new(self);
        let scan = protected_scan(
            &self.pp_queue,
            self.registry.as_ref(),
            &self.running,
            now,
            &mut processor,
        );

        PostProcessOutcome {
            visited: scan.visited,
            processed: processor.processed,
            dropped: processor.dropped,
            stopped: scan.stopped,
        }
    }

    fn dispatch(&self, claim_id: ClaimId, node_id: NodeId, now: Usec) -> DispatchOutcome {
        let mut dispatcher = Dispatcher::new(self, claim_id, node_id, now);
        let scan = protected_scan(
            &self.hub_queue,
            self.registry.as_ref(),
            &self.running,
            now,
            &mut dispatcher,
        );

        let (bundle, mut outcome) = dispatcher.finish();
        outcome.visited = scan.visited;
        outcome.stopped = scan.stopped;

        if let Some(mut bundle) = bundle {
            if !bundle.is_empty() && self.running.is_running() {
                bundle.set_version_hash(self.version_hash());
                outcome.messages = bundle.len();
                outcome.sent = true;
                self.hub.send_contexts_updated(bundle);
            } else {
                bundle.discard();
            }
        }

        outcome
    }
}
