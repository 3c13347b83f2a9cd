//! # Hubqueue Host
//! Per-host context queues: tracks which contexts have changes the hub has
//! not seen yet, sends them in bounded, versioned bundles when the hub is
//! reachable, prunes them when it is not, and drains the local
//! post-processing queue.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod shared {
    pub use hubqueue_shared::{
        ClaimId, Context, ContextContent, ContextQueues, ContextUpdate, ContextsUpdated,
        DispatchPolicy, Flags, Immediate, MemoryRegistry, Membership, NodeId, QueueSet,
        QueueStatus, ReasonDelays, Registry, RunningFlag, Timestamp, Usec,
    };
}

mod dispatcher;
mod error;
mod host;
mod hub;
mod outcome;
mod post_processor;
mod pruner;

cfg_if! {
    if #[cfg(feature = "worker")] {
        mod worker;
        pub use worker::{ContextWorker, WorkerConfig, WorkerHandle};
    }
}

pub use error::HostError;
pub use host::{HostConfig, HostContexts};
pub use hub::{HubLink, PostProcess};
pub use outcome::{
    CycleOutcome, DispatchOutcome, HubPass, PostProcessOutcome, PruneMode, PruneOutcome,
};
