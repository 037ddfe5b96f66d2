//! Score tracking.

use serde::{Deserialize, Serialize};

use crate::events::{EventBus, GameEvent};

/// Running score of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    score: u64,
    glory: u64,
    kills: u32,
    zones_cleared: u32,
}

impl Scoreboard {
    /// Total score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Total glory.
    #[must_use]
    pub const fn glory(&self) -> u64 {
        self.glory
    }

    /// Enemies defeated.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.kills
    }

    /// Zones cleared.
    #[must_use]
    pub const fn zones_cleared(&self) -> u32 {
        self.zones_cleared
    }

    /// Records a defeated enemy worth `score` and `glory`.
    pub fn record_kill(&mut self, score: u64, glory: u64, events: &EventBus) {
        self.kills += 1;
        self.add_score(score, events);
        self.add_glory(glory, events);
    }

    /// Records a cleared zone.
    pub fn record_zone(&mut self, reward: u64, glory: u64, events: &EventBus) {
        self.zones_cleared += 1;
        self.add_score(reward, events);
        self.add_glory(glory, events);
    }

    /// Records the level-completion glory.
    pub fn record_level(&mut self, glory: u64, events: &EventBus) {
        self.add_glory(glory, events);
    }

    fn add_score(&mut self, delta: u64, events: &EventBus) {
        if delta == 0 {
            return;
        }
        self.score = self.score.saturating_add(delta);
        events.publish(GameEvent::ScoreChanged {
            score: self.score,
            delta,
        });
    }

    fn add_glory(&mut self, delta: u64, events: &EventBus) {
        if delta == 0 {
            return;
        }
        self.glory = self.glory.saturating_add(delta);
        events.publish(GameEvent::GloryChanged {
            glory: self.glory,
            delta,
        });
    }
}
