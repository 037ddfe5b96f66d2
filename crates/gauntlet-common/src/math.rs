//! Ground-plane math helpers.
//!
//! The simulation runs on the XZ plane; Y is height and is ignored by
//! distance checks and movement.

pub use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Below this length a direction is treated as zero.
const DIRECTION_EPSILON: f32 = 0.001;

/// Distance between two points on the XZ plane.
#[must_use]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    (dx * dx + dz * dz).sqrt()
}

/// Unit direction from `from` to `to` on the XZ plane, or zero when the
/// points coincide.
#[must_use]
pub fn horizontal_direction(from: Vec3, to: Vec3) -> Vec3 {
    let flat = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    if flat.length() < DIRECTION_EPSILON {
        Vec3::ZERO
    } else {
        flat.normalize()
    }
}

/// Point on a horizontal circle: `center + radius * (cos θ, 0, sin θ)` with
/// `θ = 360° * index / count`.
#[must_use]
pub fn ring_point(center: Vec3, radius: f32, index: usize, count: usize) -> Vec3 {
    if count == 0 {
        return center;
    }
    let angle = (360.0 / count as f32 * index as f32).to_radians();
    center + Vec3::new(angle.cos(), 0.0, angle.sin()) * radius
}

/// Axis-aligned bound on the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    /// Minimum (x, z)
    pub min: Vec2,
    /// Maximum (x, z)
    pub max: Vec2,
}

impl Bounds2 {
    /// Creates a bound; corners are reordered so that `min <= max`.
    #[must_use]
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Clamps the X and Z components of a position into the bound.
    #[must_use]
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        Vec3::new(
            position.x.clamp(self.min.x, self.max.x),
            position.y,
            position.z.clamp(self.min.y, self.max.y),
        )
    }

    /// Checks whether a position lies inside the bound.
    #[must_use]
    pub fn contains(&self, position: Vec3) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.z >= self.min.y
            && position.z <= self.max.y
    }
}

impl Default for Bounds2 {
    fn default() -> Self {
        Self::new(Vec2::new(-10.0, -5.0), Vec2::new(10.0, 5.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_point_first_slot_on_x_axis() {
        let p = ring_point(Vec3::new(1.0, 0.0, 1.0), 2.0, 0, 8);
        assert!((p - Vec3::new(3.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_ring_point_quarter_turn() {
        let p = ring_point(Vec3::ZERO, 2.0, 2, 8);
        assert!((p - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn test_direction_zero_when_coincident() {
        assert_eq!(horizontal_direction(Vec3::ONE, Vec3::ONE), Vec3::ZERO);
    }

    #[test]
    fn test_bounds_clamp_keeps_height() {
        let bounds = Bounds2::new(Vec2::new(5.0, 5.0), Vec2::new(-5.0, -5.0));
        let clamped = bounds.clamp(Vec3::new(9.0, 3.0, -7.0));
        assert_eq!(clamped, Vec3::new(5.0, 3.0, -5.0));
        assert!(bounds.contains(clamped));
    }
}
