/// Dispatching queued contexts to the hub

use std::{sync::Arc, time::Duration};

use hubqueue_host::{DispatchOutcome, HostConfig, HostContexts, HubPass};
use hubqueue_shared::{
    Context, Flags, Immediate, MemoryRegistry, NodeId, ReasonDelays, Registry, Timestamp,
    USEC_PER_SEC,
};
use hubqueue_test::{
    TestContext, TestHost, TestHub, TestPostProcess, TEST_CLAIM_ID, TEST_NODE_ID,
};

const NOW: u64 = 1_700_000_000 * USEC_PER_SEC;
const NOW_S: u64 = 1_700_000_000;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn dispatched(pass: HubPass) -> DispatchOutcome {
    match pass {
        HubPass::Dispatched(outcome) => outcome,
        other => panic!("expected a dispatch pass, got {:?}", other),
    }
}

fn streaming_host(config: HostConfig) -> TestHost {
    let test = TestHost::builder().config(config).build();
    test.start_streaming();
    test
}

#[test]
fn sends_changed_contexts_in_one_bundle() {
    init_logger();
    let test = streaming_host(HostConfig::default());
    let a = test.add_queued("a", NOW);
    let b = test.add_queued("b", NOW);

    let outcome = dispatched(test.host.dispatch_to_hub(NOW + 1));

    assert_eq!(outcome.dispatched, 2);
    assert_eq!(outcome.messages, 2);
    assert!(outcome.sent);
    assert!(test.host.hub_queue().is_empty());

    let bundles = test.hub.take_sent();
    assert_eq!(bundles.len(), 1);
    let bundle = &bundles[0];
    assert_eq!(bundle.claim_id().as_str(), TEST_CLAIM_ID);
    assert_eq!(bundle.node_id(), NodeId::from_u128(TEST_NODE_ID));
    assert_eq!(bundle.created_at(), NOW + 1);
    let ids: Vec<&str> = bundle.updates().iter().map(|update| update.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    for context in [&a, &b] {
        assert_eq!(context.queues().hub().dispatches(), 1);
        assert_eq!(context.queues().hub().dequeued_at(), NOW + 1);
        assert!(!context.flags().check(Flags::QUEUED_FOR_HUB));
        assert_eq!(context.hub_version(), NOW_S);
    }
}

#[test]
fn version_hash_covers_registry_not_just_bundle() {
    let test = streaming_host(HostConfig::default());
    test.add_queued("a", NOW);
    let idle = test.add("idle");
    idle.content().lock().hub_version = 40;
    let gone = test.add("gone");
    {
        let mut content = gone.content().lock();
        content.hub_version = 1_000;
        content.deleted = true;
    }

    dispatched(test.host.dispatch_to_hub(NOW));

    let bundles = test.hub.take_sent();
    assert_eq!(bundles[0].version_hash(), NOW_S + 40);
    assert_eq!(test.host.version_hash(), NOW_S + 40);
}

#[test]
fn version_hash_skips_hidden_contexts() {
    let test = streaming_host(HostConfig::default());
    let hidden = test.add("hidden");
    hidden.hide();
    hidden.touch(Flags::UPDATED_OBJECT);
    test.host.queue_for_hub(&hidden, NOW);
    let visible = test.add_queued("visible", NOW);

    let outcome = dispatched(test.host.dispatch_to_hub(NOW));
    assert_eq!(outcome.dispatched, 2);
    assert_eq!(outcome.messages, 1);
    assert_eq!(hidden.hub_version(), NOW_S);

    let bundles = test.hub.take_sent();
    let sent: u64 = bundles[0].updates().iter().map(|update| update.version).sum();
    assert_eq!(sent, visible.hub_version());
    assert_eq!(bundles[0].version_hash(), sent);
    assert_eq!(test.host.version_hash(), NOW_S);
}

#[test]
fn versions_never_go_backwards() {
    let test = streaming_host(HostConfig::default());
    let context = test.add_queued("a", NOW);
    dispatched(test.host.dispatch_to_hub(NOW));
    assert_eq!(context.hub_version(), NOW_S);

    // same second, the version still moves forward
    context.touch(Flags::CHANGED_METADATA);
    test.host.queue_for_hub(&context, NOW);
    dispatched(test.host.dispatch_to_hub(NOW));
    assert_eq!(context.hub_version(), NOW_S + 1);
    assert_eq!(context.queues().hub().dispatches(), 2);
}

#[test]
fn never_exceeds_messages_per_bundle() {
    let test = streaming_host(HostConfig {
        messages_per_bundle: 3,
        ..HostConfig::default()
    });
    let contexts: Vec<_> = (0..5)
        .map(|i| test.add_queued(&format!("ctx{}", i), NOW))
        .collect();

    let outcome = dispatched(test.host.dispatch_to_hub(NOW));
    assert_eq!(outcome.dispatched, 3);
    assert_eq!(outcome.messages, 3);
    assert_eq!(outcome.visited, 3);
    assert!(outcome.stopped);
    assert_eq!(contexts[3].hub_updates(), 0);
    assert_eq!(test.host.hub_queue().entries(), 2);
    assert!(test.host.hub_queue().contains(&contexts[3]));
    assert!(test.host.hub_queue().contains(&contexts[4]));

    let outcome = dispatched(test.host.dispatch_to_hub(NOW + 1));
    assert_eq!(outcome.dispatched, 2);
    assert!(!outcome.stopped);
    assert!(test.host.hub_queue().is_empty());

    let sizes: Vec<usize> = test.hub.take_sent().iter().map(|bundle| bundle.len()).collect();
    assert_eq!(sizes, vec![3, 2]);
}

#[test]
fn unchanged_context_is_dequeued_without_a_message() {
    let test = streaming_host(HostConfig::default());
    let context = test.add("quiet");
    test.host.queue_for_hub(&context, NOW);

    let outcome = dispatched(test.host.dispatch_to_hub(NOW));

    assert_eq!(outcome.unchanged, 1);
    assert_eq!(outcome.dispatched, 0);
    assert!(!outcome.sent);
    assert!(test.host.hub_queue().is_empty());
    assert_eq!(test.hub.sent_count(), 0);
    assert_eq!(context.hub_updates(), 0);
    assert_eq!(context.queues().hub().dispatches(), 0);
}

#[test]
fn hidden_context_counts_but_empty_bundle_is_discarded() {
    init_logger();
    let test = streaming_host(HostConfig {
        messages_per_bundle: 1,
        ..HostConfig::default()
    });
    let hidden = test.add("hidden");
    hidden.hide();
    hidden.touch(Flags::UPDATED_OBJECT);
    test.host.queue_for_hub(&hidden, NOW);
    let visible = test.add_queued("visible", NOW);

    let outcome = dispatched(test.host.dispatch_to_hub(NOW));

    assert_eq!(outcome.dispatched, 1);
    assert_eq!(outcome.messages, 0);
    assert!(!outcome.sent);
    assert_eq!(test.hub.sent_count(), 0);
    assert_eq!(hidden.hub_updates(), 1);
    assert_eq!(hidden.hub_version(), NOW_S);
    assert!(test.host.hub_queue().contains(&visible));
}

#[test]
fn deleted_context_is_cleaned_up_after_its_last_update() {
    let test = streaming_host(HostConfig::default());
    let context = test.add_queued("old.chart", NOW);
    test.host.queue_for_post_processing(&context, NOW);
    context.mark_deleted();
    test.host.queue_for_hub(&context, NOW);

    let outcome = dispatched(test.host.dispatch_to_hub(NOW));

    assert_eq!(outcome.dispatched, 1);
    assert_eq!(outcome.deleted, 1);
    assert_eq!(context.persisted_deletes(), 1);
    assert!(!test.registry.contains("old.chart"));
    assert!(!test.host.post_process_queue().contains(&context));
    assert!(!context.flags().check(Flags::QUEUED_FOR_PP));
    assert!(test.host.hub_queue().is_empty());

    let bundles = test.hub.take_sent();
    assert!(bundles[0].updates()[0].deleted);
    assert_eq!(bundles[0].version_hash(), 0);
}

/// Registry where another actor re-creates a context under the same id just
/// before the dispatcher deletes it
struct RecreatingRegistry {
    inner: Arc<MemoryRegistry<TestContext>>,
}

impl Registry<TestContext> for RecreatingRegistry {
    fn acquire(&self, id: &str) -> Option<Arc<TestContext>> {
        self.inner.acquire(id)
    }

    fn delete(&self, id: &str) -> bool {
        self.inner.delete(id)
    }

    fn delete_current(&self, context: &Arc<TestContext>) -> bool {
        self.inner.insert(TestContext::new(context.id()));
        self.inner.delete_current(context)
    }

    fn for_each(&self, visit: &mut dyn FnMut(&Arc<TestContext>)) {
        self.inner.for_each(visit)
    }
}

#[test]
fn recreated_context_survives_terminal_cleanup() {
    init_logger();
    let inner = Arc::new(MemoryRegistry::new());
    let registry: Arc<dyn Registry<TestContext>> = Arc::new(RecreatingRegistry {
        inner: inner.clone(),
    });
    let hub = Arc::new(TestHub::new(Some(TEST_CLAIM_ID), true));
    let host = HostContexts::new(
        "recreate-host",
        HostConfig::default(),
        registry,
        hub.clone(),
        TestPostProcess::new(),
    )
    .with_dispatch_policy(Immediate);
    host.set_node_id(NodeId::from_u128(TEST_NODE_ID));
    host.enable_context_streaming(true);

    let context = TestContext::new("chart");
    inner.insert(context.clone());
    context.mark_deleted();
    host.queue_for_hub(&context, NOW);

    let outcome = dispatched(host.dispatch_to_hub(NOW));

    assert_eq!(outcome.deleted, 1);
    assert_eq!(context.persisted_deletes(), 1);
    assert!(inner.contains("chart"));
    assert!(!inner.is_current(&context));
    assert!(host.hub_queue().is_empty());
    assert_eq!(hub.sent_count(), 1);
}

#[test]
fn stale_entry_stays_queued_for_dispatch() {
    let test = streaming_host(HostConfig::default());
    let old = test.add_queued("cpu", NOW);
    let replacement = test.add("cpu");

    let outcome = dispatched(test.host.dispatch_to_hub(NOW));

    assert_eq!(outcome.stale, 1);
    assert_eq!(outcome.dispatched, 0);
    assert!(test.host.hub_queue().contains(&old));
    assert_eq!(old.hub_updates(), 0);
    assert_eq!(replacement.hub_updates(), 0);
}

#[test]
fn destroyed_context_is_removed_by_dispatch() {
    let test = streaming_host(HostConfig::default());
    let context = test.add_queued("gone", NOW);
    test.registry.delete("gone");
    drop(context);

    let outcome = dispatched(test.host.dispatch_to_hub(NOW));

    assert_eq!(outcome.visited, 1);
    assert!(test.host.hub_queue().is_empty());
    assert_eq!(test.hub.sent_count(), 0);
}

#[test]
fn reason_delays_hold_contexts_back() {
    let test = TestHost::builder()
        .config(HostConfig {
            dispatch_delays: ReasonDelays::new(Duration::from_secs(60))
                .with_delay(Flags::STARTED_BEING_COLLECTED, Duration::from_secs(5))
                .with_delay(Flags::NEW_OBJECT, Duration::from_secs(65)),
            ..HostConfig::default()
        })
        .with_reason_delays()
        .build();
    test.start_streaming();

    let fast = test.add("fast");
    fast.touch(Flags::STARTED_BEING_COLLECTED);
    test.host.queue_for_hub(&fast, NOW);
    let slow = test.add_queued("slow", NOW);

    let outcome = dispatched(test.host.dispatch_to_hub(NOW + USEC_PER_SEC));
    assert_eq!(outcome.deferred, 2);
    assert_eq!(test.host.hub_queue().entries(), 2);
    assert_eq!(
        fast.queues().hub().scheduled_dispatch_at(),
        NOW + 5 * USEC_PER_SEC
    );

    let outcome = dispatched(test.host.dispatch_to_hub(NOW + 6 * USEC_PER_SEC));
    assert_eq!(outcome.dispatched, 1);
    assert_eq!(outcome.deferred, 1);
    assert!(test.host.hub_queue().contains(&slow));

    let outcome = dispatched(test.host.dispatch_to_hub(NOW + 65 * USEC_PER_SEC));
    assert_eq!(outcome.dispatched, 1);
    assert!(test.host.hub_queue().is_empty());
}

#[test]
fn requeue_pushes_dispatch_time_back() {
    let test = TestHost::builder().with_reason_delays().build();
    test.start_streaming();
    let context = test.add("unused");
    context.touch(Flags::UNUSED);
    test.host.queue_for_hub(&context, NOW);

    dispatched(test.host.dispatch_to_hub(NOW + USEC_PER_SEC));
    assert_eq!(context.queues().hub().scheduled_dispatch_at(), NOW + 5 * USEC_PER_SEC);

    test.host.queue_for_hub(&context, NOW + 4 * USEC_PER_SEC);
    let outcome = dispatched(test.host.dispatch_to_hub(NOW + 6 * USEC_PER_SEC));
    assert_eq!(outcome.deferred, 1);
    assert_eq!(context.queues().hub().scheduled_dispatch_at(), NOW + 9 * USEC_PER_SEC);
}

#[test]
fn stopped_host_sends_nothing() {
    let test = streaming_host(HostConfig::default());
    test.add_queued("a", Timestamp::now_usec());
    test.host.running().stop();

    let outcome = dispatched(test.host.dispatch_to_hub(Timestamp::now_usec()));

    assert!(outcome.stopped);
    assert!(!outcome.sent);
    assert_eq!(test.hub.sent_count(), 0);
    assert_eq!(test.host.hub_queue().entries(), 1);
}
