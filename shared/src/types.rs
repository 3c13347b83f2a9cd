use std::{fmt, time::Duration};

/// Microseconds since UNIX epoch
pub type Usec = u64;
/// Position of an entry inside a `QueueSet`; 0 is never assigned
pub type SlotIndex = u64;

pub const USEC_PER_SEC: Usec = 1_000_000;

pub fn duration_to_usec(duration: &Duration) -> Usec {
    u64::try_from(duration.as_micros()).unwrap_or(Usec::MAX)
}

/// Credential proving the agent is registered with the hub
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClaimId(String);

impl ClaimId {
    pub fn new<S: Into<String>>(claim_id: S) -> Self {
        Self(claim_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity the hub assigned to a host. The all-zero id means "not assigned yet".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeId(u128);

impl NodeId {
    pub const ZERO: NodeId = NodeId(0);

    pub fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    // lowercase 8-4-4-4-12
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff
        )
    }
}
