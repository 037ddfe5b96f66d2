//! ID types for agents, zones and spawners.

use serde::{Deserialize, Serialize};

/// Unique identifier for an agent in an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(u64);

impl AgentId {
    /// Creates an agent ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid agent ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) agent ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Hands out agent IDs in increasing order.
///
/// Each arena owns one, so two arenas built from the same seed assign the
/// same IDs to the same spawns.
#[derive(Debug, Clone)]
pub struct AgentIdAllocator {
    next: u64,
}

impl Default for AgentIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl AgentIdAllocator {
    /// Returns a fresh ID.
    pub fn next_id(&mut self) -> AgentId {
        let id = AgentId(self.next);
        self.next += 1;
        id
    }
}

/// Index of a zone (stage) within a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(u16);

impl ZoneId {
    /// Creates a zone ID from a raw index.
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the zone index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies one spawner: its zone plus its position in the zone's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpawnerKey {
    /// Owning zone
    pub zone: ZoneId,
    /// Position within the zone's spawner list
    pub slot: u16,
}

impl SpawnerKey {
    /// Creates a spawner key.
    #[must_use]
    pub const fn new(zone: ZoneId, slot: u16) -> Self {
        Self { zone, slot }
    }
}

impl std::fmt::Display for SpawnerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "zone{}/spawner{}", self.zone.0, self.slot)
    }
}
