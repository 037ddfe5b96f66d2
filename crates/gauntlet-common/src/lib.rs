//! # Gauntlet Common
//!
//! Common types, utilities, and shared abstractions for the Gauntlet combat core.
//!
//! This crate provides foundational types used across all Gauntlet crates:
//! - ID types (AgentId, ZoneId, SpawnerKey)
//! - Ground-plane math over `glam::Vec3`
//! - Collision layer masks
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod layers;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::layers::*;
    pub use crate::math::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_allocation() {
        let mut ids = AgentIdAllocator::default();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert!(a.is_valid());
        assert!(!AgentId::NULL.is_valid());
    }

    #[test]
    fn test_horizontal_distance_ignores_height() {
        let a = Vec3::new(0.0, 10.0, 0.0);
        let b = Vec3::new(3.0, -4.0, 4.0);
        assert!((horizontal_distance(a, b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_layer_mask_contains() {
        let mask = LayerMask::ENEMY | LayerMask::BOSS;
        assert!(mask.contains(LayerMask::BOSS));
        assert!(!mask.contains(LayerMask::PLAYER));
    }
}
