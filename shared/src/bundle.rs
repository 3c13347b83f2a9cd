use log::debug;

use crate::{ClaimId, NodeId, Usec};

/// One context's state as announced to the hub
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextUpdate {
    pub id: String,
    pub version: u64,
    pub title: String,
    pub units: String,
    pub family: String,
    pub chart_type: String,
    pub priority: u32,
    pub first_entry_s: u64,
    pub last_entry_s: u64,
    pub deleted: bool,
}

/// A batch of context updates sent to the hub as one message
#[derive(Debug)]
pub struct ContextsUpdated {
    claim_id: ClaimId,
    node_id: NodeId,
    reserved: u64,
    created_at: Usec,
    version_hash: u64,
    updates: Vec<ContextUpdate>,
}

impl ContextsUpdated {
    pub fn new(claim_id: ClaimId, node_id: NodeId, reserved: u64, created_at: Usec) -> Self {
        Self {
            claim_id,
            node_id,
            reserved,
            created_at,
            version_hash: 0,
            updates: Vec::new(),
        }
    }

    pub fn push(&mut self, update: ContextUpdate) {
        self.updates.push(update);
    }

    /// Attached once, right before the bundle is sent
    pub fn set_version_hash(&mut self, version_hash: u64) {
        self.version_hash = version_hash;
    }

    pub fn claim_id(&self) -> &ClaimId {
        &self.claim_id
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn reserved(&self) -> u64 {
        self.reserved
    }

    pub fn created_at(&self) -> Usec {
        self.created_at
    }

    pub fn version_hash(&self) -> u64 {
        self.version_hash
    }

    pub fn updates(&self) -> &[ContextUpdate] {
        &self.updates
    }

    pub fn into_updates(self) -> Vec<ContextUpdate> {
        self.updates
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Drops a bundle that will not be sent
    pub fn discard(self) {
        debug!(
            "discarding contexts bundle for node {} with {} updates",
            self.node_id,
            self.updates.len()
        );
    }
}
