//! Per-agent finite state machine.
//!
//! Each [`State`] variant carries the data it needs across ticks (timers,
//! the dash latch, the patrol target), so exiting a state drops it and
//! re-entering starts fresh. Shared enter/exit side effects live here;
//! per-tick decisions live in the behaviors.

use serde::{Deserialize, Serialize};

use gauntlet_common::{AgentId, Vec3};

use crate::agent::Body;
use crate::events::{AnimationCue, EventBus, GameEvent, SoundCue};
use crate::input::InputFrame;
use crate::rng::SimRng;
use crate::slots::SlotAllocator;
use crate::timer::Countdown;

/// Discriminant of [`State`], used in events and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    /// Standing still
    Idle,
    /// Circling at a ring slot
    Patrol,
    /// Moving toward the target
    Chase,
    /// In attack range, attacking on cooldown
    Attack,
    /// Staggered
    Hit,
    /// Boss dash
    Dash,
    /// Terminal
    Dead,
    /// Player walking or running
    Move,
    /// Player in the air
    Airborne,
}

/// Agent state with its per-state data.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    /// Standing still
    Idle,
    /// Circling at a ring slot
    Patrol {
        /// Slot position from the last request
        slot_target: Vec3,
        /// Time until a new slot is requested
        retarget: Countdown,
    },
    /// Moving toward the target
    Chase,
    /// Attacking
    Attack {
        /// Swing window; the player returns to Idle when it elapses
        window: Option<Countdown>,
    },
    /// Staggered after taking damage
    Hit {
        /// Time until recovery
        recover: Countdown,
    },
    /// Boss dash
    Dash {
        /// Dash direction
        direction: Vec3,
        /// Time left
        remaining: Countdown,
        /// Single-hit latch
        has_hit: bool,
    },
    /// Dead; removed from the arena once the grace period runs out
    Dead {
        /// Time until removal
        removal: Countdown,
    },
    /// Player walking or running
    Move,
    /// Player in the air
    Airborne {
        /// Time until landing
        landing: Countdown,
    },
}

impl State {
    /// Patrol with a retarget interval; the slot is requested on enter.
    #[must_use]
    pub fn patrol(retarget_interval: f32) -> Self {
        Self::Patrol {
            slot_target: Vec3::ZERO,
            retarget: Countdown::new(retarget_interval),
        }
    }

    /// Hit with a recovery time.
    #[must_use]
    pub fn hit(duration: f32) -> Self {
        Self::Hit {
            recover: Countdown::new(duration),
        }
    }

    /// Dead with a removal delay.
    #[must_use]
    pub fn dead(removal_delay: f32) -> Self {
        Self::Dead {
            removal: Countdown::new(removal_delay),
        }
    }

    /// Dash with a fresh latch.
    #[must_use]
    pub fn dash(direction: Vec3, duration: f32) -> Self {
        Self::Dash {
            direction,
            remaining: Countdown::new(duration),
            has_hit: false,
        }
    }

    /// Discriminant.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::Patrol { .. } => StateKind::Patrol,
            Self::Chase => StateKind::Chase,
            Self::Attack { .. } => StateKind::Attack,
            Self::Hit { .. } => StateKind::Hit,
            Self::Dash { .. } => StateKind::Dash,
            Self::Dead { .. } => StateKind::Dead,
            Self::Move => StateKind::Move,
            Self::Airborne { .. } => StateKind::Airborne,
        }
    }
}

/// Snapshot of the agent AI is targeting (the player).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    /// Target ID
    pub id: AgentId,
    /// Target position
    pub position: Vec3,
    /// Target is dead
    pub is_dead: bool,
}

/// Everything a state update may touch besides the agent itself.
pub struct TickContext<'a> {
    /// Simulation time at the end of this tick
    pub now: f64,
    /// Tick length in seconds
    pub dt: f32,
    /// The player, if present
    pub target: Option<TargetView>,
    /// Input for the player this tick
    pub input: InputFrame,
    /// Ground query result for the ticking agent
    pub grounded: bool,
    /// Slot ring
    pub slots: &'a mut SlotAllocator,
    /// Shared random source
    pub rng: &'a mut SimRng,
    /// Event bus
    pub events: &'a EventBus,
    /// Agents that died during this tick
    pub defeated: &'a mut Vec<AgentId>,
}

impl TickContext<'_> {
    /// The target, if present and alive.
    #[must_use]
    pub fn living_target(&self) -> Option<TargetView> {
        self.target.filter(|t| !t.is_dead)
    }
}

/// Holds the current state and applies transitions.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: State,
    started: bool,
    transitions: u32,
}

impl StateMachine {
    /// Creates a machine whose initial state is entered on [`Self::start`].
    #[must_use]
    pub fn new(initial: State) -> Self {
        Self {
            current: initial,
            started: false,
            transitions: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.current
    }

    /// Current state, mutably, for advancing its timers.
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.current
    }

    /// Current state discriminant.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        self.current.kind()
    }

    /// Checks whether the machine reached the terminal state.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        matches!(self.current, State::Dead { .. })
    }

    /// Checks whether the initial state has been entered.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Number of transitions taken.
    #[must_use]
    pub const fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Enters the initial state once.
    pub fn start(&mut self, body: &mut Body, ctx: &mut TickContext<'_>) {
        if self.started {
            return;
        }
        self.started = true;
        enter(&mut self.current, body, ctx);
    }

    /// Exits the current state and enters `next`.
    ///
    /// Once the body is dead only `Dead` may be entered, and once `Dead`
    /// is entered nothing else can be, so death side effects run exactly
    /// once. Returns whether the transition happened.
    pub fn change_state(
        &mut self,
        body: &mut Body,
        next: State,
        ctx: &mut TickContext<'_>,
    ) -> bool {
        if self.is_dead() {
            return false;
        }
        if body.is_dead && !matches!(next, State::Dead { .. }) {
            return false;
        }

        let from = self.kind();
        if self.started {
            exit(&mut self.current, body, ctx);
        }
        self.current = next;
        self.started = true;
        self.transitions += 1;
        enter(&mut self.current, body, ctx);

        ctx.events.publish(GameEvent::StateChanged {
            agent: body.id,
            from,
            to: self.kind(),
        });
        true
    }
}

fn enter(state: &mut State, body: &mut Body, ctx: &mut TickContext<'_>) {
    let id = body.id;
    match state {
        State::Idle => {
            body.velocity = Vec3::ZERO;
            ctx.events.animation(id, AnimationCue::Idle);
        },
        State::Patrol { slot_target, .. } => {
            let player = ctx.living_target().map(|t| t.position);
            *slot_target = ctx.slots.request_slot(body, player);
            ctx.events.animation(id, AnimationCue::Move);
        },
        State::Chase | State::Move => {
            ctx.events.animation(id, AnimationCue::Move);
        },
        State::Attack { .. } => {
            body.velocity = Vec3::ZERO;
            ctx.events.animation(id, AnimationCue::Attack);
        },
        State::Hit { .. } => {
            body.velocity = Vec3::ZERO;
            ctx.events.animation(id, AnimationCue::Hit);
            ctx.events.sound(id, SoundCue::Hurt);
        },
        State::Dash { .. } => {
            ctx.events.animation(id, AnimationCue::Dash);
            ctx.events.sound(id, SoundCue::Dash);
        },
        State::Airborne { .. } => {
            ctx.events.animation(id, AnimationCue::Jump);
            ctx.events.sound(id, SoundCue::Jump);
        },
        State::Dead { .. } => {
            if let Some(index) = body.assigned_slot.take() {
                ctx.slots.release_slot(index);
            }
            body.velocity = Vec3::ZERO;
            body.is_dead = true;
            ctx.events.animation(id, AnimationCue::Fall);
            ctx.events.sound(id, SoundCue::Death);
            ctx.events.publish(GameEvent::AgentDefeated {
                agent: id,
                role: body.role,
            });
            ctx.defeated.push(id);
        },
    }
}

fn exit(state: &mut State, body: &mut Body, ctx: &mut TickContext<'_>) {
    match state {
        State::Patrol { .. } => {
            if let Some(index) = body.assigned_slot.take() {
                ctx.slots.release_slot(index);
            }
            body.velocity = Vec3::ZERO;
        },
        State::Chase | State::Dash { .. } | State::Move => {
            body.velocity = Vec3::ZERO;
        },
        _ => {},
    }
}
