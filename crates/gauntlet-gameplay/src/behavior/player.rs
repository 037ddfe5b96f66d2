//! Player: input-driven movement, attack, jump.

use super::{recovered, stagger, Behavior};
use crate::agent::{Body, CooldownGate, DamageOutcome};
use crate::combat::AttackRequest;
use crate::config::PlayerTuning;
use crate::events::{AnimationCue, SoundCue};
use crate::input::InputFrame;
use crate::state::{State, StateKind, StateMachine, TickContext};
use crate::timer::Countdown;

/// Player decision logic.
#[derive(Debug, Clone)]
pub struct PlayerBehavior {
    tuning: PlayerTuning,
}

impl PlayerBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new(tuning: PlayerTuning) -> Self {
        Self { tuning }
    }

    fn steer(&self, body: &mut Body, input: &InputFrame) {
        let speed = if input.run {
            body.stats.move_speed * self.tuning.run_multiplier
        } else {
            body.stats.move_speed
        };
        body.velocity = input.direction() * speed;
    }

    fn strike(&self, body: &Body) -> AttackRequest {
        AttackRequest::melee(
            body.position,
            self.tuning.attack_range,
            body.stats.base_damage,
            body.role.hostile_layers(),
        )
    }

    /// Idle or Move depending on the stick.
    fn settle(
        &self,
        body: &mut Body,
        fsm: &mut StateMachine,
        input: &InputFrame,
        ctx: &mut TickContext<'_>,
    ) {
        if input.is_moving() {
            if fsm.kind() != StateKind::Move {
                fsm.change_state(body, State::Move, ctx);
            }
            self.steer(body, input);
        } else if fsm.kind() != StateKind::Idle {
            fsm.change_state(body, State::Idle, ctx);
        }
    }
}

impl Behavior for PlayerBehavior {
    fn initial_state(&self) -> State {
        State::Idle
    }

    fn needs_target(&self) -> bool {
        false
    }

    fn update(
        &mut self,
        body: &mut Body,
        fsm: &mut StateMachine,
        ctx: &mut TickContext<'_>,
    ) -> Vec<AttackRequest> {
        let mut attacks = Vec::new();
        let input = ctx.input;
        let dt = ctx.dt;

        match fsm.kind() {
            StateKind::Hit => {
                if recovered(fsm, dt) {
                    self.settle(body, fsm, &input, ctx);
                }
            },
            StateKind::Attack => {
                let done = match fsm.state_mut() {
                    State::Attack {
                        window: Some(window),
                    } => window.tick(dt),
                    _ => true,
                };
                if done {
                    self.settle(body, fsm, &input, ctx);
                }
            },
            StateKind::Airborne => {
                self.steer(body, &input);
                // The kick does not end the jump.
                if input.attack && body.air_kick.is_ready(ctx.now) {
                    attacks.push(self.strike(body).gated_by(CooldownGate::AirKick));
                    ctx.events.animation(body.id, AnimationCue::AirKick);
                    ctx.events.sound(body.id, SoundCue::Swing);
                }
                let landed = match fsm.state_mut() {
                    State::Airborne { landing } => landing.tick(dt),
                    _ => true,
                };
                if landed && ctx.grounded {
                    self.settle(body, fsm, &input, ctx);
                }
            },
            StateKind::Idle | StateKind::Move => {
                if input.attack && body.melee.is_ready(ctx.now) {
                    let window = Some(Countdown::new(self.tuning.attack_window));
                    fsm.change_state(body, State::Attack { window }, ctx);
                    attacks.push(self.strike(body));
                    ctx.events.sound(body.id, SoundCue::Swing);
                } else if input.jump && ctx.grounded {
                    let landing = Countdown::new(self.tuning.jump_duration);
                    fsm.change_state(body, State::Airborne { landing }, ctx);
                    self.steer(body, &input);
                } else {
                    self.settle(body, fsm, &input, ctx);
                }
            },
            _ => {},
        }
        attacks
    }

    fn on_damaged(
        &mut self,
        body: &mut Body,
        fsm: &mut StateMachine,
        outcome: &DamageOutcome,
        ctx: &mut TickContext<'_>,
    ) {
        stagger(body, fsm, outcome, self.tuning.hit_duration, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Role, Stats};
    use crate::events::GameEvent;
    use crate::state::test_support::Harness;
    use gauntlet_common::{AgentId, Vec3};

    fn player() -> (Body, StateMachine, PlayerBehavior) {
        let tuning = PlayerTuning::default();
        let body = Body::new(AgentId::from_raw(1), "player", Role::Player, Stats::default())
            .with_attack_cooldown(tuning.attack_cooldown)
            .with_air_kick_cooldown(tuning.air_kick_cooldown);
        let behavior = PlayerBehavior::new(tuning);
        let fsm = StateMachine::new(behavior.initial_state());
        (body, fsm, behavior)
    }

    #[test]
    fn test_move_and_run() {
        let mut h = Harness::new();
        let (mut body, mut fsm, mut p) = player();
        h.input = InputFrame::moving(1.0, 0.0);
        p.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(fsm.kind(), StateKind::Move);
        assert_eq!(body.velocity, Vec3::new(5.0, 0.0, 0.0));

        h.input.run = true;
        p.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert!((body.velocity.x - 9.0).abs() < 1e-5);

        h.input = InputFrame::default();
        p.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(fsm.kind(), StateKind::Idle);
        assert_eq!(body.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_attack_respects_cooldown() {
        let mut h = Harness::new();
        let (mut body, mut fsm, mut p) = player();
        h.input = InputFrame::attacking();

        let first = p.update(&mut body, &mut fsm, &mut h.ctx(0.25));
        assert_eq!(first.len(), 1);
        assert_eq!(fsm.kind(), StateKind::Attack);
        // The resolver records the swing.
        body.melee.record(0.25);

        p.update(&mut body, &mut fsm, &mut h.ctx(0.25));
        assert_eq!(fsm.kind(), StateKind::Idle);
        let blocked = p.update(&mut body, &mut fsm, &mut h.ctx(0.25));
        assert!(blocked.is_empty());
    }

    #[test]
    fn test_jump_lands() {
        let mut h = Harness::new();
        let (mut body, mut fsm, mut p) = player();
        h.input = InputFrame {
            jump: true,
            ..InputFrame::default()
        };
        p.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(fsm.kind(), StateKind::Airborne);

        h.input = InputFrame::default();
        for _ in 0..7 {
            p.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        }
        assert_eq!(fsm.kind(), StateKind::Idle);
    }

    #[test]
    fn test_air_kick_has_its_own_cooldown() {
        let mut h = Harness::new();
        let (mut body, mut fsm, mut p) = player();
        h.input = InputFrame {
            jump: true,
            ..InputFrame::default()
        };
        p.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(fsm.kind(), StateKind::Airborne);

        h.input = InputFrame::attacking();
        let kick = p.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(kick.len(), 1);
        assert_eq!(kick[0].gate, CooldownGate::AirKick);
        assert_eq!(fsm.kind(), StateKind::Airborne);
        assert!(h.events.drain().contains(&GameEvent::Animation {
            agent: body.id,
            cue: AnimationCue::AirKick,
        }));
        body.air_kick.record(h.now);

        let blocked = p.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert!(blocked.is_empty());
        assert!(body.melee.is_ready(h.now));
    }
}
