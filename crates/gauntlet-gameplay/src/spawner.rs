//! Capped wave spawning.
//!
//! A [`WaveSpawner`] produces a fixed total of agents of one archetype,
//! never more than `max_alive` at a time, in passes spaced by the spawn
//! interval. Defeats are reported back with [`WaveSpawner::notify_defeated`]
//! and the spawner answers with [`SpawnerSignal`]s instead of callbacks.

use std::collections::BTreeSet;
use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use gauntlet_common::{AgentId, SpawnerKey, Vec3};

use crate::config::SpawnerDef;
use crate::events::{EventBus, GameEvent};
use crate::rng::SimRng;
use crate::timer::Countdown;

/// Lifecycle of a spawner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnerPhase {
    /// Not started
    Idle,
    /// Spawn passes are scheduled
    Spawning,
    /// Everything spawned, waiting for the last defeats
    Draining,
    /// Everything spawned and defeated
    Done,
    /// Stopped early; no more passes
    Stopped,
}

/// Creates agents on behalf of a spawner.
pub trait AgentFactory {
    /// Spawns one agent, or returns `None` when the archetype cannot be
    /// instantiated.
    fn spawn(&mut self, spawner: SpawnerKey, archetype: &str, position: Vec3) -> Option<AgentId>;
}

/// What a spawner reports back to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerSignal {
    /// An agent was spawned
    Spawned(AgentId),
    /// One of this spawner's agents was defeated
    AgentDefeated(AgentId),
    /// Every agent was spawned and defeated
    AllDefeated,
}

/// Spawns one archetype in capped waves.
#[derive(Debug, Clone)]
pub struct WaveSpawner {
    key: SpawnerKey,
    def: SpawnerDef,
    enabled: bool,
    phase: SpawnerPhase,
    spawned: u32,
    defeated: u32,
    alive: BTreeSet<AgentId>,
    pending: Option<Countdown>,
    rng: SimRng,
}

impl WaveSpawner {
    /// Creates a spawner. Spawners without an archetype are disabled.
    #[must_use]
    pub fn new(key: SpawnerKey, def: SpawnerDef, rng: SimRng) -> Self {
        let enabled = def.enabled && def.archetype.is_some();
        if !enabled {
            warn!("Spawner '{}' ({}) is disabled", def.name, key);
        }
        Self {
            key,
            def,
            enabled,
            phase: SpawnerPhase::Idle,
            spawned: 0,
            defeated: 0,
            alive: BTreeSet::new(),
            pending: None,
            rng,
        }
    }

    /// Switches the spawner off; it will not start and counts for nothing.
    pub fn disable(&mut self, reason: &str) {
        warn!("Disabling spawner '{}' ({}): {}", self.def.name, self.key, reason);
        self.enabled = false;
    }

    /// Spawner key.
    #[must_use]
    pub const fn key(&self) -> SpawnerKey {
        self.key
    }

    /// Definition.
    #[must_use]
    pub const fn def(&self) -> &SpawnerDef {
        &self.def
    }

    /// Checks whether the spawner takes part in its zone.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SpawnerPhase {
        self.phase
    }

    /// Agents spawned so far.
    #[must_use]
    pub const fn spawned_count(&self) -> u32 {
        self.spawned
    }

    /// Agents of this spawner defeated so far.
    #[must_use]
    pub const fn defeated_count(&self) -> u32 {
        self.defeated
    }

    /// Agents of this spawner currently alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Checks whether an agent belongs to this spawner and is alive.
    #[must_use]
    pub fn is_tracking(&self, agent: AgentId) -> bool {
        self.alive.contains(&agent)
    }

    /// Agents this spawner will produce; zero when disabled.
    #[must_use]
    pub const fn total_to_spawn(&self) -> u32 {
        if self.enabled {
            self.def.total_to_spawn
        } else {
            0
        }
    }

    /// Starts spawning; the first pass runs after the initial delay.
    /// Returns false when disabled or already started.
    pub fn start(&mut self) -> bool {
        if !self.enabled {
            debug!("Spawner {} is disabled, not starting", self.key);
            return false;
        }
        if self.phase != SpawnerPhase::Idle {
            debug!("Spawner {} already started ({:?})", self.key, self.phase);
            return false;
        }
        info!(
            "Spawner {} starting: {} x {} (max {} alive)",
            self.key,
            self.def.total_to_spawn,
            self.def.archetype.as_deref().unwrap_or("?"),
            self.def.max_alive
        );
        self.phase = SpawnerPhase::Spawning;
        self.pending = Some(Countdown::new(self.def.initial_delay));
        true
    }

    /// Cancels pending passes. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.pending = None;
        if matches!(self.phase, SpawnerPhase::Spawning | SpawnerPhase::Draining) {
            debug!("Spawner {} stopped", self.key);
            self.phase = SpawnerPhase::Stopped;
        }
    }

    /// Returns to Idle with all counters cleared.
    pub fn reset(&mut self) {
        self.phase = SpawnerPhase::Idle;
        self.spawned = 0;
        self.defeated = 0;
        self.alive.clear();
        self.pending = None;
    }

    /// Advances the pass timer and runs a pass when it is due.
    pub fn tick(
        &mut self,
        dt: f32,
        factory: &mut dyn AgentFactory,
        events: &EventBus,
    ) -> Vec<SpawnerSignal> {
        let mut signals = Vec::new();
        if self.phase != SpawnerPhase::Spawning {
            return signals;
        }
        let Some(timer) = self.pending.as_mut() else {
            return signals;
        };
        if !timer.tick(dt) {
            return signals;
        }

        self.spawn_pass(factory, events, &mut signals);

        if self.spawned >= self.def.total_to_spawn {
            self.phase = SpawnerPhase::Draining;
            self.pending = None;
            self.check_cleared(events, &mut signals);
        } else {
            self.pending = Some(Countdown::new(self.def.spawn_interval));
        }
        signals
    }

    /// Records a defeat. Unknown or already reported agents are ignored.
    pub fn notify_defeated(&mut self, agent: AgentId, events: &EventBus) -> Vec<SpawnerSignal> {
        let mut signals = Vec::new();
        if !self.alive.remove(&agent) {
            return signals;
        }
        self.defeated += 1;
        signals.push(SpawnerSignal::AgentDefeated(agent));
        self.check_cleared(events, &mut signals);
        signals
    }

    fn spawn_pass(
        &mut self,
        factory: &mut dyn AgentFactory,
        events: &EventBus,
        signals: &mut Vec<SpawnerSignal>,
    ) {
        let room = (self.def.max_alive as usize).saturating_sub(self.alive.len());
        let left = self.def.total_to_spawn.saturating_sub(self.spawned) as usize;
        let count = room.min(left);

        let Some(archetype) = self.def.archetype.clone() else {
            return;
        };
        for _ in 0..count {
            let position = self.pick_position();
            match factory.spawn(self.key, &archetype, position) {
                Some(agent) => {
                    self.alive.insert(agent);
                    self.spawned += 1;
                    signals.push(SpawnerSignal::Spawned(agent));
                },
                None => {
                    warn!(
                        "Spawner {} could not spawn '{}', retrying next pass",
                        self.key, archetype
                    );
                    events.publish(GameEvent::SpawnDropped {
                        spawner: self.key,
                        reason: format!("archetype '{archetype}' unavailable"),
                    });
                    break;
                },
            }
        }
    }

    fn check_cleared(&mut self, events: &EventBus, signals: &mut Vec<SpawnerSignal>) {
        if self.phase == SpawnerPhase::Draining && self.alive.is_empty() {
            self.phase = SpawnerPhase::Done;
            info!("Spawner {} cleared", self.key);
            events.publish(GameEvent::SpawnerCleared { spawner: self.key });
            signals.push(SpawnerSignal::AllDefeated);
        }
    }

    /// A spawn point (or the origin) plus random jitter within the radius.
    fn pick_position(&mut self) -> Vec3 {
        let base = match self.rng.index(self.def.spawn_points.len()) {
            Some(i) => self.def.spawn_points[i],
            None => self.def.origin,
        };
        if self.def.spawn_radius <= 0.0 {
            return base;
        }
        let angle = self.rng.range(0.0, TAU);
        let distance = self.def.spawn_radius * self.rng.unit().sqrt();
        base + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance
    }
}
