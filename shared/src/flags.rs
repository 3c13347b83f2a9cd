use std::{
    fmt,
    ops::{BitAnd, BitOr, BitOrAssign, Not},
    sync::atomic::{AtomicU32, Ordering},
};

/// Bit set describing the state of a context and why it needs to be
/// sent to the hub again
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);

    // State
    pub const DELETED: Flags = Flags(1 << 0);
    pub const HIDDEN: Flags = Flags(1 << 1);
    pub const QUEUED_FOR_HUB: Flags = Flags(1 << 2);
    pub const QUEUED_FOR_PP: Flags = Flags(1 << 3);

    // Update reasons
    pub const TRIGGERED: Flags = Flags(1 << 8);
    pub const NEW_OBJECT: Flags = Flags(1 << 9);
    pub const UPDATED_OBJECT: Flags = Flags(1 << 10);
    pub const LOAD_SQL: Flags = Flags(1 << 11);
    pub const CHANGED_METADATA: Flags = Flags(1 << 12);
    pub const ZERO_RETENTION: Flags = Flags(1 << 13);
    pub const CHANGED_FIRST_TIME: Flags = Flags(1 << 14);
    pub const CHANGED_LAST_TIME: Flags = Flags(1 << 15);
    pub const STOPPED_BEING_COLLECTED: Flags = Flags(1 << 16);
    pub const STARTED_BEING_COLLECTED: Flags = Flags(1 << 17);
    pub const UNUSED: Flags = Flags(1 << 18);
    pub const CHANGED_LINKING: Flags = Flags(1 << 19);
    pub const DISCONNECTED_CHILD: Flags = Flags(1 << 20);
    pub const DB_ROTATION: Flags = Flags(1 << 21);
    pub const UPDATE_RETENTION: Flags = Flags(1 << 22);

    pub const QUEUE_BITS: Flags = Self::QUEUED_FOR_HUB.union(Self::QUEUED_FOR_PP);
    pub const UPDATE_REASONS: Flags = Flags(0x007f_ff00);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Flags) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn difference(self, other: Flags) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Only the update-reason bits
    pub const fn reasons(self) -> Self {
        Self(self.0 & Self::UPDATE_REASONS.0)
    }

    pub fn names(self) -> impl Iterator<Item = &'static str> {
        FLAG_NAMES
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }
}

const FLAG_NAMES: [(Flags, &str); 19] = [
    (Flags::DELETED, "deleted"),
    (Flags::HIDDEN, "hidden"),
    (Flags::QUEUED_FOR_HUB, "queued for hub"),
    (Flags::QUEUED_FOR_PP, "queued for post-processing"),
    (Flags::TRIGGERED, "triggered transition"),
    (Flags::NEW_OBJECT, "object created"),
    (Flags::UPDATED_OBJECT, "object updated"),
    (Flags::LOAD_SQL, "loaded from sql"),
    (Flags::CHANGED_METADATA, "changed metadata"),
    (Flags::ZERO_RETENTION, "has no retention"),
    (Flags::CHANGED_FIRST_TIME, "updated first entry time"),
    (Flags::CHANGED_LAST_TIME, "updated last entry time"),
    (Flags::STOPPED_BEING_COLLECTED, "stopped collected"),
    (Flags::STARTED_BEING_COLLECTED, "started collected"),
    (Flags::UNUSED, "unused"),
    (Flags::CHANGED_LINKING, "changed rrd link"),
    (Flags::DISCONNECTED_CHILD, "child disconnected"),
    (Flags::DB_ROTATION, "db rotation"),
    (Flags::UPDATE_RETENTION, "updated retention"),
];

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        self.union(rhs)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Flags {
    type Output = Flags;

    fn bitand(self, rhs: Flags) -> Flags {
        Flags(self.0 & rhs.0)
    }
}

impl Not for Flags {
    type Output = Flags;

    fn not(self) -> Flags {
        Flags(!self.0)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flags({:#x}: ", self.0)?;
        f.debug_list().entries(self.names()).finish()?;
        f.write_str(")")
    }
}

/// A context's flag word, shared between producers and the queue engine
#[derive(Default)]
pub struct AtomicFlags(AtomicU32);

impl AtomicFlags {
    pub fn new(flags: Flags) -> Self {
        Self(AtomicU32::new(flags.bits()))
    }

    pub fn get(&self) -> Flags {
        Flags(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, flags: Flags) {
        self.0.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    pub fn clear(&self, flags: Flags) {
        self.0.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    pub fn check(&self, flags: Flags) -> bool {
        self.get().contains(flags)
    }
}

impl fmt::Debug for AtomicFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}
