//! Read-only physics queries used by gameplay.
//!
//! Gameplay never owns colliders. It asks an [`OverlapQuery`] which agents
//! are inside a sphere and a [`GroundQuery`] whether a point stands on the
//! ground.

use gauntlet_common::{AgentId, LayerMask, Vec3};

/// Sphere overlap against agent colliders.
pub trait OverlapQuery {
    /// Agents on `mask` whose collider intersects the sphere.
    fn overlap_sphere(&self, point: Vec3, radius: f32, mask: LayerMask) -> Vec<AgentId>;
}

/// Ground contact query.
pub trait GroundQuery {
    /// Checks whether a position stands on the ground.
    fn is_grounded(&self, position: Vec3) -> bool;
}

/// An infinite flat floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatGround {
    /// Floor height
    pub height: f32,
    /// Contact tolerance
    pub tolerance: f32,
}

impl Default for FlatGround {
    fn default() -> Self {
        Self {
            height: 0.0,
            tolerance: 0.05,
        }
    }
}

impl GroundQuery for FlatGround {
    fn is_grounded(&self, position: Vec3) -> bool {
        position.y <= self.height + self.tolerance
    }
}

/// Mock overlap query for testing: always answers with a fixed list.
#[derive(Debug, Default)]
pub struct MockOverlap {
    candidates: Vec<AgentId>,
}

impl MockOverlap {
    /// Creates a mock that reports `candidates` for every query.
    #[must_use]
    pub fn new(candidates: Vec<AgentId>) -> Self {
        Self { candidates }
    }
}

impl OverlapQuery for MockOverlap {
    fn overlap_sphere(&self, _point: Vec3, _radius: f32, _mask: LayerMask) -> Vec<AgentId> {
        self.candidates.clone()
    }
}
