//! Boss: a looping step pattern plus health-threshold phases.
//!
//! The pattern is a list of [`BossStep`]s. Each phase may use its own
//! pattern; a phase change takes effect when the current pattern wraps.
//! Phases also shorten waits and the dash cooldown.

use serde::{Deserialize, Serialize};
use tracing::info;

use gauntlet_common::{horizontal_direction, horizontal_distance, Vec3};

use super::{ensure, recovered, stagger, Behavior};
use crate::agent::{Body, CooldownGate, DamageOutcome};
use crate::combat::AttackRequest;
use crate::config::{AiTuning, BossTuning};
use crate::events::{GameEvent, SoundCue};
use crate::state::{State, StateKind, StateMachine, TargetView, TickContext};
use crate::timer::{Countdown, Sequence};

/// One step of a boss pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossStep {
    /// Stand still for the given seconds
    Wait(f32),
    /// Walk toward the target until within attack range
    Search,
    /// Close to contact distance and strike once the cooldown allows
    Strike,
    /// Dash at the target if the dash cooldown allows, otherwise skip
    Dash,
}

/// Phase after a hit that took health from `before` to `after` (fractions).
///
/// Every threshold `t[i]` with `before > t[i] >= after` raises the phase to
/// at least `i + 1`. The phase never decreases.
#[must_use]
pub fn phase_after_damage(thresholds: &[f32], before: f32, after: f32, current: usize) -> usize {
    thresholds
        .iter()
        .enumerate()
        .filter(|(_, t)| before > **t && after <= **t)
        .map(|(i, _)| i + 1)
        .fold(current, usize::max)
}

/// Boss decision logic.
#[derive(Debug, Clone)]
pub struct BossBehavior {
    ai: AiTuning,
    tuning: BossTuning,
    phase: usize,
    sequence: Sequence<BossStep>,
    step_timer: Option<Countdown>,
    last_dash: Option<f64>,
}

impl BossBehavior {
    /// Creates the behavior in phase 0.
    #[must_use]
    pub fn new(ai: AiTuning, tuning: BossTuning) -> Self {
        let sequence = Sequence::new(pattern_for(&tuning, 0));
        Self {
            ai,
            tuning,
            phase: 0,
            sequence,
            step_timer: None,
            last_dash: None,
        }
    }

    /// Current phase (0 before any threshold is crossed).
    #[must_use]
    pub const fn current_phase(&self) -> usize {
        self.phase
    }

    /// Step under the cursor.
    #[must_use]
    pub fn current_step(&self) -> Option<BossStep> {
        self.sequence.current().copied()
    }

    /// Multiplier applied to waits and the dash cooldown in the current phase.
    #[must_use]
    pub fn phase_scale(&self) -> f32 {
        (1.0 - self.tuning.phase_speedup)
            .powi(self.phase as i32)
            .max(0.25)
    }

    fn dash_ready(&self, now: f64) -> bool {
        let cooldown = f64::from(self.tuning.dash_cooldown * self.phase_scale());
        self.last_dash.map_or(true, |last| now >= last + cooldown)
    }

    fn timer(&mut self, seconds: f32) -> &mut Countdown {
        self.step_timer.get_or_insert_with(|| Countdown::new(seconds))
    }

    fn finish_step(&mut self) {
        self.step_timer = None;
        if self.sequence.advance() {
            let pattern = pattern_for(&self.tuning, self.phase);
            self.sequence.replace(pattern);
        }
    }

    fn approach(&self, body: &mut Body, target: TargetView) {
        body.velocity =
            horizontal_direction(body.position, target.position) * body.stats.move_speed;
    }

    /// Runs the current step. Returns true when it is finished.
    fn run_step(
        &mut self,
        step: BossStep,
        body: &mut Body,
        fsm: &mut StateMachine,
        target: TargetView,
        ctx: &mut TickContext<'_>,
        attacks: &mut Vec<AttackRequest>,
    ) -> bool {
        let distance = horizontal_distance(body.position, target.position);
        let dt = ctx.dt;

        match step {
            BossStep::Wait(seconds) => {
                ensure(body, fsm, State::Idle, ctx);
                body.velocity = Vec3::ZERO;
                let scaled = seconds * self.phase_scale();
                self.timer(scaled).tick(dt)
            },
            BossStep::Search => {
                ensure(body, fsm, State::Chase, ctx);
                if distance <= self.ai.attack_range {
                    body.velocity = Vec3::ZERO;
                    return true;
                }
                self.approach(body, target);
                let timeout = self.tuning.search_timeout;
                self.timer(timeout).tick(dt)
            },
            BossStep::Strike => {
                ensure(body, fsm, State::Attack { window: None }, ctx);
                if distance <= self.tuning.strike_distance {
                    body.velocity = Vec3::ZERO;
                    if body.melee.is_ready(ctx.now) {
                        attacks.push(AttackRequest::melee(
                            body.position,
                            self.tuning.strike_distance,
                            body.stats.base_damage,
                            body.role.hostile_layers(),
                        ));
                        ctx.events.sound(body.id, SoundCue::Swing);
                        return true;
                    }
                    return false;
                }
                self.approach(body, target);
                let timeout = self.tuning.search_timeout;
                self.timer(timeout).tick(dt)
            },
            BossStep::Dash => {
                if !body.caps.has_dash
                    || !self.dash_ready(ctx.now)
                    || distance > self.ai.attack_range
                {
                    return true;
                }
                let direction = horizontal_direction(body.position, target.position);
                if direction == Vec3::ZERO {
                    return true;
                }
                if fsm.change_state(body, State::dash(direction, self.tuning.dash_duration), ctx) {
                    body.velocity = direction * self.tuning.dash_force;
                    self.last_dash = Some(ctx.now);
                    false
                } else {
                    true
                }
            },
        }
    }

    /// Advances an active dash; strikes at most once per dash.
    fn update_dash(
        &mut self,
        body: &mut Body,
        fsm: &mut StateMachine,
        target: TargetView,
        ctx: &mut TickContext<'_>,
        attacks: &mut Vec<AttackRequest>,
    ) {
        let distance = horizontal_distance(body.position, target.position);
        let strike_distance = self.tuning.strike_distance;
        let State::Dash {
            remaining, has_hit, ..
        } = fsm.state_mut()
        else {
            return;
        };

        if !*has_hit && distance < strike_distance {
            *has_hit = true;
            attacks.push(
                AttackRequest::melee(
                    body.position,
                    strike_distance,
                    body.stats.base_damage,
                    body.role.hostile_layers(),
                )
                .gated_by(CooldownGate::DashStrike),
            );
        }

        if remaining.tick(ctx.dt) {
            fsm.change_state(body, State::Idle, ctx);
            self.finish_step();
        }
    }
}

fn pattern_for(tuning: &BossTuning, phase: usize) -> Vec<BossStep> {
    let usable: Vec<&Vec<BossStep>> = tuning.patterns.iter().filter(|p| !p.is_empty()).collect();
    match usable.len() {
        0 => vec![BossStep::Wait(1.0), BossStep::Search, BossStep::Strike],
        len => usable[phase.min(len - 1)].clone(),
    }
}

impl Behavior for BossBehavior {
    fn initial_state(&self) -> State {
        State::Idle
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

        match fsm.kind() {
            StateKind::Dash => {
                self.update_dash(body, fsm, target, ctx, &mut attacks);
                return attacks;
            },
            StateKind::Hit => {
                if recovered(fsm, ctx.dt) {
                    fsm.change_state(body, State::Idle, ctx);
                }
                return attacks;
            },
            _ => {},
        }

        let Some(step) = self.current_step() else {
            return attacks;
        };
        if self.run_step(step, body, fsm, target, ctx, &mut attacks) {
            self.finish_step();
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
        if body.caps.has_phase_logic {
            let before = outcome.fraction_before(body.stats.max_health);
            let after = outcome.fraction_after(body.stats.max_health);
            let next = phase_after_damage(&self.tuning.phase_thresholds, before, after, self.phase);
            if next > self.phase {
                info!("{} entered phase {} ({:.0}% health)", body.id, next, after * 100.0);
                ctx.events.publish(GameEvent::BossPhaseChanged {
                    agent: body.id,
                    previous: self.phase,
                    phase: next,
                });
                ctx.events.sound(body.id, SoundCue::PhaseShift);
                self.phase = next;
            }
        }
        stagger(body, fsm, outcome, self.ai.hit_duration, ctx);
    }

    fn phase(&self) -> Option<usize> {
        Some(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Role, Stats};
    use crate::state::test_support::Harness;
    use gauntlet_common::AgentId;
    use proptest::prelude::*;

    fn boss_body(position: Vec3) -> Body {
        Body::new(
            AgentId::from_raw(7),
            "warden",
            Role::Boss,
            Stats::default().with_health(100.0).with_defense(0.0).with_damage(30.0),
        )
        .at(position)
        .with_attack_cooldown(2.0)
    }

    fn boss_with(pattern: Vec<BossStep>) -> BossBehavior {
        let ai = AiTuning {
            attack_range: 5.0,
            ..AiTuning::default()
        };
        let tuning = BossTuning {
            patterns: vec![pattern],
            ..BossTuning::default()
        };
        BossBehavior::new(ai, tuning)
    }

    #[test]
    fn test_phase_crossing_rule() {
        let t = [0.75, 0.5, 0.25];
        assert_eq!(phase_after_damage(&t, 1.0, 0.4, 0), 2);
        assert_eq!(phase_after_damage(&t, 1.0, 0.75, 0), 1);
        assert_eq!(phase_after_damage(&t, 0.75, 0.6, 1), 1);
        assert_eq!(phase_after_damage(&t, 0.4, 0.0, 2), 3);
        assert_eq!(phase_after_damage(&t, 0.9, 0.8, 2), 2);
    }

    #[test]
    fn test_damage_to_forty_percent_enters_phase_two() {
        let mut h = Harness::new().with_player_at(Vec3::new(20.0, 0.0, 0.0));
        let mut body = boss_body(Vec3::ZERO);
        let mut fsm = StateMachine::new(State::Idle);
        let mut boss = boss_with(vec![BossStep::Wait(1.0)]);

        let outcome = body.apply_damage(60.0);
        boss.on_damaged(&mut body, &mut fsm, &outcome, &mut h.ctx(0.1));
        assert_eq!(boss.current_phase(), 2);
        assert_eq!(boss.phase(), Some(2));
        assert_eq!(fsm.kind(), StateKind::Idle);

        let phase_events: Vec<GameEvent> = h
            .events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::BossPhaseChanged { .. }))
            .collect();
        assert_eq!(
            phase_events,
            vec![GameEvent::BossPhaseChanged {
                agent: body.id,
                previous: 0,
                phase: 2
            }]
        );
    }

    #[test]
    fn test_wait_then_search() {
        let mut h = Harness::new().with_player_at(Vec3::new(20.0, 0.0, 0.0));
        let mut body = boss_body(Vec3::ZERO);
        let mut fsm = StateMachine::new(State::Idle);
        let mut boss = boss_with(vec![BossStep::Wait(0.5), BossStep::Search]);

        boss.update(&mut body, &mut fsm, &mut h.ctx(0.25));
        assert_eq!(boss.current_step(), Some(BossStep::Wait(0.5)));
        boss.update(&mut body, &mut fsm, &mut h.ctx(0.25));
        assert_eq!(boss.current_step(), Some(BossStep::Search));

        boss.update(&mut body, &mut fsm, &mut h.ctx(0.25));
        assert_eq!(fsm.kind(), StateKind::Chase);
        assert!(body.velocity.x > 0.0);
    }

    #[test]
    fn test_strike_in_contact() {
        let mut h = Harness::new().with_player_at(Vec3::new(0.5, 0.0, 0.0));
        let mut body = boss_body(Vec3::ZERO);
        let mut fsm = StateMachine::new(State::Idle);
        let mut boss = boss_with(vec![BossStep::Strike, BossStep::Wait(1.0)]);

        let attacks = boss.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].gate, CooldownGate::Melee);
        assert_eq!(attacks[0].raw_damage, 30.0);
        assert_eq!(boss.current_step(), Some(BossStep::Wait(1.0)));
    }

    #[test]
    fn test_dash_hits_once_and_clamps() {
        let mut h = Harness::new().with_player_at(Vec3::new(0.5, 0.0, 0.0));
        let mut body = boss_body(Vec3::ZERO);
        body.dash_bounds = Some(gauntlet_common::Bounds2::default());
        let mut fsm = StateMachine::new(State::Idle);
        let mut boss = boss_with(vec![BossStep::Dash, BossStep::Wait(5.0)]);

        let attacks = boss.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert!(attacks.is_empty());
        assert_eq!(fsm.kind(), StateKind::Dash);
        assert_eq!(body.velocity, Vec3::new(20.0, 0.0, 0.0));

        let mut strikes = 0;
        for _ in 0..20 {
            strikes += boss.update(&mut body, &mut fsm, &mut h.ctx(0.1)).len();
            body.integrate(0.1, body.dash_bounds);
            assert!(body.position.x <= 10.0);
        }
        assert_eq!(strikes, 1);
        assert_ne!(fsm.kind(), StateKind::Dash);
        assert_eq!(boss.current_step(), Some(BossStep::Wait(5.0)));
    }

    #[test]
    fn test_dash_skipped_on_cooldown() {
        let mut h = Harness::new().with_player_at(Vec3::new(0.5, 0.0, 0.0));
        let mut body = boss_body(Vec3::ZERO);
        let mut fsm = StateMachine::new(State::Idle);
        let mut boss = boss_with(vec![BossStep::Dash]);
        boss.last_dash = Some(0.0);

        boss.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        assert_eq!(fsm.kind(), StateKind::Idle);
    }

    #[test]
    fn test_pattern_switches_on_wrap_after_phase_change() {
        let ai = AiTuning::default();
        let tuning = BossTuning {
            patterns: vec![
                vec![BossStep::Wait(0.1), BossStep::Wait(0.1)],
                vec![BossStep::Search],
            ],
            ..BossTuning::default()
        };
        let mut h = Harness::new().with_player_at(Vec3::new(50.0, 0.0, 0.0));
        let mut body = boss_body(Vec3::ZERO);
        let mut fsm = StateMachine::new(State::Idle);
        let mut boss = BossBehavior::new(ai, tuning);

        let outcome = body.apply_damage(30.0);
        boss.on_damaged(&mut body, &mut fsm, &outcome, &mut h.ctx(0.0));
        assert_eq!(boss.current_phase(), 1);
        assert!(matches!(boss.current_step(), Some(BossStep::Wait(_))));

        for _ in 0..10 {
            boss.update(&mut body, &mut fsm, &mut h.ctx(0.1));
        }
        assert_eq!(boss.current_step(), Some(BossStep::Search));
    }

    proptest! {
        #[test]
        fn prop_phase_monotonic(hits in proptest::collection::vec(0.0f32..40.0, 1..30)) {
            let thresholds = [0.75, 0.5, 0.25];
            let mut health = 100.0f32;
            let mut phase = 0;
            for hit in hits {
                let before = health / 100.0;
                health = (health - hit).max(0.0);
                let after = health / 100.0;
                let next = phase_after_damage(&thresholds, before, after, phase);
                prop_assert!(next >= phase);
                prop_assert!(next <= thresholds.len());
                phase = next;
            }
            let crossed = thresholds.iter().filter(|t| health / 100.0 <= **t).count();
            prop_assert_eq!(phase, crossed);
        }
    }
}
