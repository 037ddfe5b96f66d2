//! Persisted timers and step sequences.
//!
//! Anything that waits across ticks (hit recovery, death grace, spawn
//! intervals, boss pattern steps) stores one of these in its own state and
//! advances it with the tick's `dt`.

use serde::{Deserialize, Serialize};

/// A timer counting down to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    /// Creates a countdown of `seconds` (negative values become zero).
    #[must_use]
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    /// An already elapsed countdown.
    #[must_use]
    pub const fn elapsed() -> Self {
        Self { remaining: 0.0 }
    }

    /// Advances by `dt`. Returns true once the countdown has reached zero.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        self.remaining <= 0.0
    }

    /// Seconds left.
    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Checks whether the countdown has run out.
    #[must_use]
    pub fn is_elapsed(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Restarts at `seconds`.
    pub fn reset(&mut self, seconds: f32) {
        self.remaining = seconds.max(0.0);
    }
}

/// Cursor over a list of steps that loops back to the start.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<T> {
    steps: Vec<T>,
    index: usize,
    cycles: u32,
}

impl<T> Sequence<T> {
    /// Creates a sequence positioned at the first step.
    #[must_use]
    pub fn new(steps: Vec<T>) -> Self {
        Self {
            steps,
            index: 0,
            cycles: 0,
        }
    }

    /// The step under the cursor, or `None` for an empty sequence.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.steps.get(self.index)
    }

    /// Moves to the next step. Returns true when this wrapped to the start.
    pub fn advance(&mut self) -> bool {
        if self.steps.is_empty() {
            return false;
        }
        self.index += 1;
        if self.index >= self.steps.len() {
            self.index = 0;
            self.cycles += 1;
            true
        } else {
            false
        }
    }

    /// Replaces the steps and rewinds.
    pub fn replace(&mut self, steps: Vec<T>) {
        self.steps = steps;
        self.index = 0;
    }

    /// Current step index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Completed passes over the list.
    #[must_use]
    pub const fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Checks whether there are no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_elapses() {
        let mut timer = Countdown::new(0.5);
        assert!(!timer.tick(0.2));
        assert!(!timer.tick(0.2));
        assert!(timer.tick(0.2));
        assert!(timer.is_elapsed());
        assert_eq!(timer.remaining(), 0.0);
    }

    #[test]
    fn test_countdown_ignores_negative_dt() {
        let mut timer = Countdown::new(1.0);
        timer.tick(-5.0);
        assert_eq!(timer.remaining(), 1.0);
    }

    #[test]
    fn test_sequence_wraps() {
        let mut seq = Sequence::new(vec!['a', 'b']);
        assert_eq!(seq.current(), Some(&'a'));
        assert!(!seq.advance());
        assert_eq!(seq.current(), Some(&'b'));
        assert!(seq.advance());
        assert_eq!(seq.current(), Some(&'a'));
        assert_eq!(seq.cycles(), 1);
    }

    #[test]
    fn test_empty_sequence() {
        let mut seq: Sequence<u8> = Sequence::new(Vec::new());
        assert!(seq.current().is_none());
        assert!(!seq.advance());
    }
}
