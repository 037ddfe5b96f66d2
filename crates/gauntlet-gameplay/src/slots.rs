//! Circle slots around the player.
//!
//! Enemies that are not attacking hold one of a fixed number of points on a
//! ring around the player, so they surround it instead of stacking up. At
//! most one agent holds a slot at a time.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gauntlet_common::{ring_point, AgentId, Vec3};

use crate::agent::Body;
use crate::rng::SimRng;

/// Slot ring settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Number of slots on the ring
    pub max_slots: usize,
    /// Ring radius
    pub radius: f32,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            max_slots: 8,
            radius: 2.5,
        }
    }
}

/// Hands out ring slots around the player.
#[derive(Debug, Clone)]
pub struct SlotAllocator {
    radius: f32,
    holders: Vec<Option<AgentId>>,
    rng: SimRng,
}

impl SlotAllocator {
    /// Creates an allocator with every slot free.
    #[must_use]
    pub fn new(config: SlotConfig, rng: SimRng) -> Self {
        Self {
            radius: config.radius,
            holders: vec![None; config.max_slots],
            rng,
        }
    }

    /// Number of slots on the ring.
    #[must_use]
    pub fn max_slots(&self) -> usize {
        self.holders.len()
    }

    /// Ring radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Agent holding a slot.
    #[must_use]
    pub fn holder(&self, index: usize) -> Option<AgentId> {
        self.holders.get(index).copied().flatten()
    }

    /// Number of held slots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.holders.iter().filter(|h| h.is_some()).count()
    }

    /// Number of free slots.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.max_slots() - self.occupied_count()
    }

    /// World position of a slot for the given player position.
    #[must_use]
    pub fn slot_position(&self, index: usize, player: Vec3) -> Vec3 {
        ring_point(player, self.radius, index, self.max_slots())
    }

    /// Gives the agent a random free slot and returns its world position.
    ///
    /// A slot the agent already holds is released first. Without a player
    /// position or a free slot the agent keeps no slot and the returned
    /// position is its own.
    pub fn request_slot(&mut self, body: &mut Body, player: Option<Vec3>) -> Vec3 {
        if let Some(held) = body.assigned_slot.take() {
            self.release_slot(held);
        }

        let Some(player) = player else {
            warn!("{} requested a slot with no player present", body.id);
            return body.position;
        };

        let free: Vec<usize> = self
            .holders
            .iter()
            .enumerate()
            .filter(|(_, holder)| holder.is_none())
            .map(|(index, _)| index)
            .collect();

        match self.rng.index(free.len()) {
            Some(pick) => {
                let index = free[pick];
                self.holders[index] = Some(body.id);
                body.assigned_slot = Some(index);
                debug!("{} took slot {}", body.id, index);
                self.slot_position(index, player)
            },
            None => {
                warn!("No free slot for {}, holding position", body.id);
                body.position
            },
        }
    }

    /// Frees a slot. Freeing a free or out-of-range slot does nothing.
    pub fn release_slot(&mut self, index: usize) {
        if let Some(holder) = self.holders.get_mut(index) {
            *holder = None;
        }
    }

    /// Frees every slot held by an agent.
    pub fn release_all_held_by(&mut self, agent: AgentId) {
        for holder in &mut self.holders {
            if *holder == Some(agent) {
                *holder = None;
            }
        }
    }
}
