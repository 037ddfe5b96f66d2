//! Regular enemy: circle at a slot, close in, attack on cooldown.

use gauntlet_common::{horizontal_direction, horizontal_distance, Vec3};

use super::{recovered, stagger, Behavior};
use crate::agent::{Body, DamageOutcome};
use crate::combat::AttackRequest;
use crate::config::AiTuning;
use crate::events::SoundCue;
use crate::state::{State, StateKind, StateMachine, TickContext};

/// Enemy decision logic.
#[derive(Debug, Clone)]
pub struct EnemyBehavior {
    tuning: AiTuning,
}

impl EnemyBehavior {
    /// Creates the behavior.
    #[must_use]
    pub fn new(tuning: AiTuning) -> Self {
        Self { tuning }
    }

    /// Tuning in use.
    #[must_use]
    pub const fn tuning(&self) -> &AiTuning {
        &self.tuning
    }

    fn patrol(&self) -> State {
        State::patrol(self.tuning.slot_change_interval)
    }

    fn roll_approach(&self, ctx: &mut TickContext<'_>) -> bool {
        ctx.rng
            .per_second(self.tuning.approach_chance, ctx.dt, self.tuning.approach_scale)
    }

    /// Enters Attack and starts the cooldown if it is not already running.
    fn enter_attack(&self, body: &mut Body, fsm: &mut StateMachine, ctx: &mut TickContext<'_>) {
        if fsm.change_state(body, State::Attack { window: None }, ctx)
            && body.melee.is_ready(ctx.now)
        {
            body.melee.record(ctx.now);
        }
    }

    /// Moves toward the held slot, re-requesting one when the interval runs out.
    fn circle(
        &self,
        body: &mut Body,
        fsm: &mut StateMachine,
        player: Vec3,
        ctx: &mut TickContext<'_>,
    ) {
        let retarget_due = match fsm.state_mut() {
            State::Patrol { retarget, .. } => retarget.tick(ctx.dt),
            _ => return,
        };

        let target = if retarget_due {
            let position = ctx.slots.request_slot(body, Some(player));
            if let State::Patrol {
                slot_target,
                retarget,
            } = fsm.state_mut()
            {
                *slot_target = position;
                retarget.reset(self.tuning.slot_change_interval);
            }
            position
        } else if let Some(index) = body.assigned_slot {
            // The ring follows the player.
            ctx.slots.slot_position(index, player)
        } else {
            match fsm.state() {
                State::Patrol { slot_target, .. } => *slot_target,
                _ => body.position,
            }
        };

        let remaining = horizontal_distance(body.position, target);
        body.velocity = if remaining > self.tuning.arrive_distance {
            horizontal_direction(body.position, target) * body.stats.move_speed
        } else {
            Vec3::ZERO
        };
    }
}

impl Behavior for EnemyBehavior {
    fn initial_state(&self) -> State {
        self.patrol()
    }

    fn update(
        &mut self,
        body: &mut Body,
        fsm: &mut StateMachine,
        ctx: &mut TickContext<'_>,
    ) -> Vec<AttackRequest> {
        let mut attacks = Vec::new();
        let Some(target) = ctx.living_target() else {
            return attacks;
        };
        let t = self.tuning;
        let distance = horizontal_distance(body.position, target.position);

        match fsm.kind() {
            StateKind::Idle => {
                fsm.change_state(body, self.patrol(), ctx);
            },
            StateKind::Patrol => {
                if distance <= t.attack_range {
                    self.enter_attack(body, fsm, ctx);
                } else if distance <= t.detection_radius && self.roll_approach(ctx) {
                    fsm.change_state(body, State::Chase, ctx);
                } else {
                    self.circle(body, fsm, target.position, ctx);
                }
            },
            StateKind::Chase => {
                if distance <= t.attack_range {
                    self.enter_attack(body, fsm, ctx);
                } else if distance > t.detection_radius {
                    fsm.change_state(body, self.patrol(), ctx);
                } else {
                    body.velocity = horizontal_direction(body.position, target.position)
                        * body.stats.move_speed;
                }
            },
            StateKind::Attack => {
                if distance <= t.attack_range {
                    body.velocity = Vec3::ZERO;
                    if body.melee.is_ready(ctx.now) {
                        attacks.push(AttackRequest::melee(
                            body.position,
                            t.attack_range,
                            body.stats.base_damage,
                            body.role.hostile_layers(),
                        ));
                        ctx.events.sound(body.id, SoundCue::Swing);
                    }
                } else if distance > t.detection_radius {
                    fsm.change_state(body, self.patrol(), ctx);
                } else {
                    fsm.change_state(body, State::Chase, ctx);
                }
            },
            StateKind::Hit => {
                if recovered(fsm, ctx.dt) {
                    fsm.change_state(body, self.patrol(), ctx);
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
    use crate::state::test_support::Harness;
    use gauntlet_common::AgentId;

    fn setup(position: Vec3, tuning: AiTuning) -> (Body, StateMachine, EnemyBehavior) {
        let body = Body::new(AgentId::from_raw(1), "grunt", Role::Enemy, Stats::default())
            .at(position)
            .with_attack_cooldown(tuning.attack_cooldown);
        let behavior = EnemyBehavior::new(tuning);
        let fsm = StateMachine::new(behavior.initial_state());
        (body, fsm, behavior)
    }

    fn never_approach() -> AiTuning {
        AiTuning {
            approach_chance: 0.0,
            ..AiTuning::default()
        }
    }

    fn always_approach() -> AiTuning {
        AiTuning {
            approach_chance: 100.0,
            ..AiTuning::default()
        }
    }

    #[test]
    fn test_patrol_moves_toward_slot() {
        let mut h = Harness::new().with_player_at(Vec3::ZERO);
        let (mut body, mut fsm, mut enemy) = setup(Vec3::new(8.0, 0.0, 0.0), never_approach());
        fsm.start(&mut body, &mut h.ctx(0.0));
        assert!(body.assigned_slot.is_some());

        enemy.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(fsm.kind(), StateKind::Patrol);
        assert!(body.velocity.length() > 0.0);
    }

    #[test]
    fn test_patrol_in_range_attacks() {
        let mut h = Harness::new().with_player_at(Vec3::ZERO);
        let (mut body, mut fsm, mut enemy) = setup(Vec3::new(1.0, 0.0, 0.0), never_approach());
        fsm.start(&mut body, &mut h.ctx(0.0));

        enemy.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(fsm.kind(), StateKind::Attack);
        assert_eq!(body.assigned_slot, None);
        assert_eq!(h.slots.occupied_count(), 0);
    }

    #[test]
    fn test_patrol_rolls_before_chasing() {
        let mut h = Harness::new().with_player_at(Vec3::ZERO);
        let (mut body, mut fsm, mut enemy) = setup(Vec3::new(6.0, 0.0, 0.0), always_approach());
        fsm.start(&mut body, &mut h.ctx(0.0));
        enemy.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(fsm.kind(), StateKind::Chase);
    }

    #[test]
    fn test_chase_then_attack_cycle() {
        let tuning = AiTuning {
            attack_cooldown: 1.0,
            ..always_approach()
        };
        let mut h = Harness::new().with_player_at(Vec3::ZERO);
        let (mut body, mut fsm, mut enemy) = setup(Vec3::new(1.5, 0.0, 0.0), tuning);
        fsm.start(&mut body, &mut h.ctx(0.0));
        fsm.change_state(&mut body, State::Chase, &mut h.ctx(0.0));

        enemy.update(&mut body, &mut fsm, &mut h.ctx(0.25));
        assert_eq!(fsm.kind(), StateKind::Attack);
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.melee.last_attack_time, Some(0.25));

        // Cooldown started on entry, so no strike until it elapses.
        let attacks = enemy.update(&mut body, &mut fsm, &mut h.ctx(0.5));
        assert!(attacks.is_empty());
        let attacks = enemy.update(&mut body, &mut fsm, &mut h.ctx(0.5));
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].raw_damage, body.stats.base_damage);
    }

    #[test]
    fn test_attack_out_of_detection_returns_to_patrol() {
        let mut h = Harness::new().with_player_at(Vec3::new(50.0, 0.0, 0.0));
        let (mut body, mut fsm, mut enemy) = setup(Vec3::ZERO, never_approach());
        fsm.change_state(&mut body, State::Attack { window: None }, &mut h.ctx(0.0));
        enemy.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(fsm.kind(), StateKind::Patrol);
    }

    #[test]
    fn test_attack_out_of_range_chases() {
        let mut h = Harness::new().with_player_at(Vec3::new(6.0, 0.0, 0.0));
        let (mut body, mut fsm, mut enemy) = setup(Vec3::ZERO, never_approach());
        fsm.change_state(&mut body, State::Attack { window: None }, &mut h.ctx(0.0));

        enemy.update(&mut body, &mut fsm, &mut h.ctx(1.0 / 60.0));
        assert_eq!(fsm.kind(), StateKind::Chase);

        enemy.update(&mut body, &mut fsm, &mut h.ctx(1.0 / 60.0));
        assert!(body.velocity.x > 0.0);
    }

    #[test]
    fn test_retreating_target_is_caught_and_struck() {
        let tuning = AiTuning {
            attack_cooldown: 0.5,
            ..never_approach()
        };
        let mut h = Harness::new().with_player_at(Vec3::new(6.0, 0.0, 0.0));
        let (mut body, mut fsm, mut enemy) = setup(Vec3::ZERO, tuning);
        fsm.change_state(&mut body, State::Attack { window: None }, &mut h.ctx(0.0));

        let dt = 1.0 / 60.0;
        let mut swings = 0;
        for _ in 0..600 {
            let attacks = enemy.update(&mut body, &mut fsm, &mut h.ctx(dt));
            if let Some(attack) = attacks.first() {
                swings += 1;
                body.melee.record(h.now);
                assert!(horizontal_distance(attack.origin, Vec3::new(6.0, 0.0, 0.0)) <= 2.0);
            }
            body.integrate(dt, None);
        }
        assert!(swings > 0);
        assert_eq!(fsm.kind(), StateKind::Attack);
    }

    #[test]
    fn test_hit_recovers_to_patrol() {
        let mut h = Harness::new().with_player_at(Vec3::new(9.0, 0.0, 0.0));
        let (mut body, mut fsm, mut enemy) = setup(Vec3::ZERO, never_approach());
        fsm.change_state(&mut body, State::hit(0.5), &mut h.ctx(0.0));
        enemy.update(&mut body, &mut fsm, &mut h.ctx(0.25));
        assert_eq!(fsm.kind(), StateKind::Hit);
        enemy.update(&mut body, &mut fsm, &mut h.ctx(0.25));
        assert_eq!(fsm.kind(), StateKind::Patrol);
    }

    #[test]
    fn test_idle_resumes_patrol_when_target_returns() {
        let mut h = Harness::new().with_player_at(Vec3::new(9.0, 0.0, 0.0));
        let (mut body, mut fsm, mut enemy) = setup(Vec3::ZERO, never_approach());
        fsm.change_state(&mut body, State::Idle, &mut h.ctx(0.0));
        enemy.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(fsm.kind(), StateKind::Patrol);
        assert!(body.assigned_slot.is_some());
    }

    #[test]
    fn test_retarget_requests_new_slot() {
        let tuning = AiTuning {
            slot_change_interval: 0.5,
            ..never_approach()
        };
        let mut h = Harness::new().with_player_at(Vec3::ZERO);
        let (mut body, mut fsm, mut enemy) = setup(Vec3::new(8.0, 0.0, 0.0), tuning);
        fsm.start(&mut body, &mut h.ctx(0.0));
        for _ in 0..10 {
            enemy.update(&mut body, &mut fsm, &mut h.ctx(0.25));
            assert_eq!(h.slots.occupied_count(), 1);
            assert!(body.assigned_slot.is_some());
        }
    }
}
