//! Per-role decision logic.
//!
//! A [`Behavior`] decides, once per tick, which state transitions to take
//! and which attacks to request. The state machine itself only knows the
//! enter/exit side effects shared by every role.

mod boss;
mod enemy;
mod player;

pub use boss::{phase_after_damage, BossBehavior, BossStep};
pub use enemy::EnemyBehavior;
pub use player::PlayerBehavior;

use std::fmt;

use crate::agent::{Body, DamageOutcome};
use crate::combat::AttackRequest;
use crate::state::{State, StateMachine, TickContext};

/// Decision logic plugged into an agent.
pub trait Behavior: fmt::Debug + Send {
    /// State entered when the agent starts ticking.
    fn initial_state(&self) -> State;

    /// Whether this behavior needs a living target to act. Agents that do
    /// fall back to Idle while there is none.
    fn needs_target(&self) -> bool {
        true
    }

    /// Runs one tick and returns the attacks to resolve.
    fn update(
        &mut self,
        body: &mut Body,
        fsm: &mut StateMachine,
        ctx: &mut TickContext<'_>,
    ) -> Vec<AttackRequest>;

    /// Reacts to damage that was applied to the body.
    fn on_damaged(
        &mut self,
        body: &mut Body,
        fsm: &mut StateMachine,
        outcome: &DamageOutcome,
        ctx: &mut TickContext<'_>,
    );

    /// Current boss phase, for behaviors that have one.
    fn phase(&self) -> Option<usize> {
        None
    }
}

/// Puts a surviving agent that staggers into Hit.
fn stagger(
    body: &mut Body,
    fsm: &mut StateMachine,
    outcome: &DamageOutcome,
    duration: f32,
    ctx: &mut TickContext<'_>,
) {
    if outcome.killed || outcome.ignored || !body.caps.staggers {
        return;
    }
    fsm.change_state(body, State::hit(duration), ctx);
}

/// Advances the Hit timer. Returns true when recovery is due.
fn recovered(fsm: &mut StateMachine, dt: f32) -> bool {
    match fsm.state_mut() {
        State::Hit { recover } => recover.tick(dt),
        _ => false,
    }
}

/// Changes state unless already in a state of the same kind.
fn ensure(body: &mut Body, fsm: &mut StateMachine, next: State, ctx: &mut TickContext<'_>) {
    if fsm.kind() != next.kind() {
        fsm.change_state(body, next, ctx);
    }
}
