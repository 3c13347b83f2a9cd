mod error;
mod membership;
mod queue_set;
mod scan;

pub use error::QueueError;
pub use membership::{ContextQueues, Membership, MembershipInfo, QueueKind};
pub use queue_set::{QueueGuard, QueueSet, QueueSlot, QueueStatus};
pub use scan::{protected_scan, ScanEntry, ScanOutcome, ScanTarget, ScanVisitor, Verdict};
