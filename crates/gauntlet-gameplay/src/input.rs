//! Player input frames.
//!
//! The player behavior reads one [`InputFrame`] per tick. Where frames come
//! from (keyboard, replay, autopilot) is up to the [`InputSource`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use gauntlet_common::{Vec2, Vec3};

/// Input sampled for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputFrame {
    /// Movement on the ground plane: x is X, y is Z
    pub move_axis: Vec2,
    /// Run modifier held
    pub run: bool,
    /// Attack pressed this tick
    pub attack: bool,
    /// Jump pressed this tick
    pub jump: bool,
}

impl InputFrame {
    /// Dead zone for the movement axis.
    pub const DEAD_ZONE: f32 = 0.1;

    /// A frame that only moves.
    #[must_use]
    pub fn moving(x: f32, z: f32) -> Self {
        Self {
            move_axis: Vec2::new(x, z),
            ..Self::default()
        }
    }

    /// A frame that only attacks.
    #[must_use]
    pub fn attacking() -> Self {
        Self {
            attack: true,
            ..Self::default()
        }
    }

    /// Checks whether the movement axis leaves the dead zone.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.move_axis.length() > Self::DEAD_ZONE
    }

    /// Movement direction as a unit vector on the XZ plane.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        if self.is_moving() {
            Vec3::new(self.move_axis.x, 0.0, self.move_axis.y).normalize()
        } else {
            Vec3::ZERO
        }
    }
}

/// Source of input frames.
pub trait InputSource {
    /// Returns the frame for the next tick.
    fn poll(&mut self) -> InputFrame;
}

/// Plays back a fixed list of frames, then idles.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputFrame>,
}

impl ScriptedInput {
    /// Creates a script from frames.
    #[must_use]
    pub fn new(frames: impl IntoIterator<Item = InputFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Appends `count` copies of a frame.
    pub fn repeat(&mut self, frame: InputFrame, count: usize) {
        self.frames.extend(std::iter::repeat(frame).take(count));
    }

    /// Frames left.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputFrame {
        self.frames.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_zone() {
        assert!(!InputFrame::moving(0.05, 0.0).is_moving());
        assert_eq!(InputFrame::moving(0.05, 0.0).direction(), Vec3::ZERO);
        let dir = InputFrame::moving(0.0, -1.0).direction();
        assert_eq!(dir, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_script_runs_out_to_idle() {
        let mut script = ScriptedInput::new([InputFrame::attacking()]);
        script.repeat(InputFrame::moving(1.0, 0.0), 2);
        assert_eq!(script.remaining(), 3);
        assert!(script.poll().attack);
        assert!(script.poll().is_moving());
        assert!(script.poll().is_moving());
        assert_eq!(script.poll(), InputFrame::default());
    }
}
