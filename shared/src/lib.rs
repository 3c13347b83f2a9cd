//! # Hubqueue Shared
//! Context queues and the building blocks shared by hubqueue-host and its tests.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

cfg_if! {
    if #[cfg(target_arch = "wasm32")]
    {
        compile_error!("the 'hubqueue_shared' crate needs native threads and a system clock, wasm targets are not supported.");
    }
}

mod backends;
mod bundle;
mod context;
mod flags;
mod log_limit;
mod policy;
mod queue;
mod registry;
mod running;
mod types;


pub use backends::{TimeError, Timestamp};
pub use bundle::{ContextUpdate, ContextsUpdated};
pub use context::{Context, ContextContent};
pub use flags::{AtomicFlags, Flags};
pub use log_limit::LogLimiter;
pub use policy::{DispatchPolicy, Immediate, ReasonDelays};
pub use queue::{
    protected_scan, ContextQueues, Membership, MembershipInfo, QueueError, QueueGuard, QueueKind,
    QueueSet, QueueSlot, QueueStatus, ScanEntry, ScanOutcome, ScanTarget, ScanVisitor, Verdict,
};
pub use registry::{MemoryRegistry, Registry};
pub use running::RunningFlag;
pub use types::{duration_to_usec, ClaimId, NodeId, SlotIndex, Usec, USEC_PER_SEC};
