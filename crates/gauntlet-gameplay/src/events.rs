//! Event bus for presentation cues and flow notifications.
//!
//! Gameplay code never talks to animation, audio or UI directly. It
//! publishes [`GameEvent`]s and whoever drives the simulation drains them.

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use gauntlet_common::{AgentId, SpawnerKey, Vec3, ZoneId};

use crate::agent::Role;
use crate::state::StateKind;

/// Animation triggers understood by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationCue {
    /// Standing still
    Idle,
    /// Walking or running
    Move,
    /// Attack swing
    Attack,
    /// Flinch
    Hit,
    /// Death fall
    Fall,
    /// Boss dash
    Dash,
    /// Player jump
    Jump,
    /// Player attack while airborne
    AirKick,
}

/// Sound triggers understood by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Weapon swing
    Swing,
    /// Damage taken
    Hurt,
    /// Death
    Death,
    /// Jump
    Jump,
    /// Boss dash
    Dash,
    /// Boss entered a new phase
    PhaseShift,
}

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Play an animation on an agent
    Animation {
        /// Agent
        agent: AgentId,
        /// Cue
        cue: AnimationCue,
    },
    /// Play a sound at an agent
    Sound {
        /// Agent
        agent: AgentId,
        /// Cue
        cue: SoundCue,
    },
    /// Agent state machine changed state
    StateChanged {
        /// Agent
        agent: AgentId,
        /// Previous state
        from: StateKind,
        /// New state
        to: StateKind,
    },
    /// Health changed after a hit
    HealthChanged {
        /// Agent
        agent: AgentId,
        /// Health after the hit
        health: f32,
        /// Maximum health
        max_health: f32,
    },
    /// Agent entered the arena
    AgentSpawned {
        /// Agent
        agent: AgentId,
        /// Archetype name
        archetype: String,
        /// Spawner that produced it, if any
        spawner: Option<SpawnerKey>,
        /// Spawn position
        position: Vec3,
    },
    /// Agent died (published exactly once per agent)
    AgentDefeated {
        /// Agent
        agent: AgentId,
        /// Role of the agent
        role: Role,
    },
    /// Dead agent was removed after its grace period
    AgentRemoved {
        /// Agent
        agent: AgentId,
    },
    /// Boss crossed a health threshold
    BossPhaseChanged {
        /// Boss agent
        agent: AgentId,
        /// Phase before the hit
        previous: usize,
        /// Phase after the hit
        phase: usize,
    },
    /// A spawn request could not be fulfilled
    SpawnDropped {
        /// Spawner
        spawner: SpawnerKey,
        /// Why it was dropped
        reason: String,
    },
    /// Every agent of a spawner has been spawned and defeated
    SpawnerCleared {
        /// Spawner
        spawner: SpawnerKey,
    },
    /// Zone became active
    ZoneStarted {
        /// Zone
        zone: ZoneId,
        /// Enemies that must be defeated
        total_enemies: u32,
    },
    /// Zone cleared
    ZoneCompleted {
        /// Zone
        zone: ZoneId,
    },
    /// Every zone cleared
    LevelCompleted,
    /// Score changed
    ScoreChanged {
        /// New total
        score: u64,
        /// Amount added
        delta: u64,
    },
    /// Glory changed
    GloryChanged {
        /// New total
        glory: u64,
        /// Amount added
        delta: u64,
    },
    /// The player died
    PlayerDefeated {
        /// Player agent
        agent: AgentId,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<GameEvent>,
    /// Receiver for collecting events
    receiver: Receiver<GameEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: GameEvent) {
        // Non-blocking send - if full, event is dropped
        let _ = self.sender.try_send(event);
    }

    /// Shorthand for an [`GameEvent::Animation`].
    pub fn animation(&self, agent: AgentId, cue: AnimationCue) {
        self.publish(GameEvent::Animation { agent, cue });
    }

    /// Shorthand for a [`GameEvent::Sound`].
    pub fn sound(&self, agent: AgentId, cue: SoundCue) {
        self.publish(GameEvent::Sound { agent, cue });
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

/// Consumer of drained events.
pub trait EventHandler {
    /// Handles an event.
    fn handle(&mut self, event: &GameEvent);
}

impl EventBus {
    /// Drains pending events into a handler. Returns how many were handled.
    pub fn dispatch(&self, handler: &mut dyn EventHandler) -> usize {
        let mut count = 0;
        while let Ok(event) = self.receiver.try_recv() {
            handler.handle(&event);
            count += 1;
        }
        count
    }
}
