//! # Gauntlet Gameplay
//!
//! Combat core for a wave-based action arena.
//!
//! This crate provides every rule that decides who moves, who hits and who
//! spawns next:
//! - Agent bodies, stats, cooldowns and damage mitigation
//! - Per-agent state machines with enter/exit effects
//! - Enemy, boss and player behaviors
//! - The slot ring that spreads enemies around the player
//! - Sphere-overlap melee resolution
//! - Wave spawners and the zone/level orchestrator
//! - Score tracking and the event bus for presentation layers
//! - The arena that ties them together on a fixed tick

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod arena;
pub mod behavior;
pub mod combat;
pub mod config;
pub mod events;
pub mod input;
pub mod physics;
pub mod rng;
pub mod roster;
pub mod score;
pub mod slots;
pub mod spawner;
pub mod stage;
pub mod state;
pub mod timer;

#[cfg(test)]
mod scenarios;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::arena::*;
    pub use crate::behavior::*;
    pub use crate::combat::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::input::*;
    pub use crate::physics::*;
    pub use crate::rng::*;
    pub use crate::roster::*;
    pub use crate::score::*;
    pub use crate::slots::*;
    pub use crate::spawner::*;
    pub use crate::stage::*;
    pub use crate::state::*;
    pub use crate::timer::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_common::{AgentId, Vec3};

    #[test]
    fn test_default_config_builds_arena() {
        let arena = Arena::new(ArenaConfig::default());
        assert!(arena.is_ok());
    }

    #[test]
    fn test_mitigation_floor() {
        let mut body = Body::new(AgentId::from_raw(1), "grunt", Role::Enemy, Stats::default());
        let outcome = body.apply_damage(3.0);
        assert_eq!(outcome.applied, 0.0);
        assert_eq!(body.health, body.stats.max_health);
    }

    #[test]
    fn test_slot_ring_positions() {
        let slots = SlotAllocator::new(SlotConfig::default(), SimRng::with_seed(1));
        let first = slots.slot_position(0, Vec3::ZERO);
        assert!((first.length() - slots.radius()).abs() < 1e-4);
    }
}
