use thiserror::Error;

use crate::SlotIndex;

/// Errors raised by `QueueSet` primitives
///
/// These indicate a corrupted queue structure, never a race: callers that
/// cannot recover use the panicking variants of the primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A context's membership index points at a slot that does not hold it
    #[error("{queue} queue slot {index} does not hold context '{context_id}', queue structure is corrupted")]
    SlotMismatch {
        queue: &'static str,
        index: SlotIndex,
        context_id: String,
    },
}
