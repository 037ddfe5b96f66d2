//! A simple player stand-in: walk to the nearest enemy and swing.

use gauntlet_common::{horizontal_direction, horizontal_distance, Vec3};
use gauntlet_gameplay::{Arena, InputFrame, Role};

/// Drives the player from the arena state.
#[derive(Debug, Clone)]
pub struct Autopilot {
    reach: f32,
}

impl Autopilot {
    /// Creates an autopilot that swings within `reach` of its target.
    #[must_use]
    pub fn new(reach: f32) -> Self {
        Self { reach }
    }

    /// Builds an autopilot from the player archetype's attack range.
    #[must_use]
    pub fn for_arena(arena: &Arena) -> Self {
        // Stay slightly inside the range so the target's collider overlaps.
        Self::new(arena.config().player.player.attack_range * 0.9)
    }

    /// Input for the next tick.
    #[must_use]
    pub fn frame(&self, arena: &Arena) -> InputFrame {
        let Some(player) = arena.player().filter(|p| !p.body.is_dead) else {
            return InputFrame::default();
        };
        let from = player.body.position;

        let nearest = arena
            .roster()
            .iter()
            .filter(|a| a.body.role != Role::Player && !a.body.is_dead)
            .map(|a| (horizontal_distance(from, a.body.position), a.body.position))
            .min_by(|a, b| a.0.total_cmp(&b.0));

        match nearest {
            Some((distance, _)) if distance <= self.reach => InputFrame::attacking(),
            Some((_, target)) => toward(from, target),
            None => InputFrame::default(),
        }
    }
}

fn toward(from: Vec3, to: Vec3) -> InputFrame {
    let direction = horizontal_direction(from, to);
    InputFrame::moving(direction.x, direction.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_gameplay::ArenaConfig;

    #[test]
    fn test_idle_without_enemies() {
        let mut arena = Arena::new(ArenaConfig::default()).expect("arena");
        arena.spawn_player();
        let pilot = Autopilot::for_arena(&arena);
        assert_eq!(pilot.frame(&arena), InputFrame::default());
    }

    #[test]
    fn test_walks_then_swings() {
        let mut arena = Arena::new(ArenaConfig::default()).expect("arena");
        arena.spawn_player();
        let pilot = Autopilot::for_arena(&arena);

        arena.spawn_archetype("grunt", Vec3::new(6.0, 0.0, 0.0));
        let frame = pilot.frame(&arena);
        assert!(frame.is_moving());
        assert!(!frame.attack);
        assert!(frame.move_axis.x > 0.9);

        arena.spawn_archetype("grunt", Vec3::new(0.0, 0.0, 1.0));
        assert!(pilot.frame(&arena).attack);
    }
}
