//! Area attack resolution.
//!
//! Attacks are requested by behaviors during their update and resolved by
//! [`CombatResolver`] against whatever [`AgentStore`] + [`OverlapQuery`]
//! the caller provides: the arena's roster in the simulation, a mock in
//! tests.

use serde::{Deserialize, Serialize};
use tracing::debug;

use gauntlet_common::{AgentId, LayerMask, Vec3};

use crate::agent::{CooldownGate, CooldownState};
use crate::physics::OverlapQuery;
use crate::roster::Agent;
use crate::state::TickContext;

/// An attack a behavior wants resolved this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackRequest {
    /// Center of the hit sphere
    pub origin: Vec3,
    /// Hit sphere radius
    pub radius: f32,
    /// Damage before the target's defense
    pub raw_damage: f32,
    /// Layers that can be hit
    pub mask: LayerMask,
    /// Cooldown that gates the attack
    pub gate: CooldownGate,
}

impl AttackRequest {
    /// A melee swing.
    #[must_use]
    pub fn melee(origin: Vec3, radius: f32, raw_damage: f32, mask: LayerMask) -> Self {
        Self {
            origin,
            radius,
            raw_damage,
            mask,
            gate: CooldownGate::Melee,
        }
    }

    /// Sets the gate.
    #[must_use]
    pub fn gated_by(mut self, gate: CooldownGate) -> Self {
        self.gate = gate;
        self
    }
}

/// One target hit by an attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitReport {
    /// Target
    pub target: AgentId,
    /// Damage after defense
    pub damage: f32,
    /// Health after the hit
    pub health_after: f32,
    /// The hit killed the target
    pub killed: bool,
}

/// Outcome of [`CombatResolver::resolve_attack`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttackResolution {
    /// The attacker's cooldown had not elapsed; nothing happened
    OnCooldown,
    /// The attack went off (possibly hitting nothing)
    Resolved(Vec<HitReport>),
}

impl AttackResolution {
    /// Targets hit, empty when on cooldown.
    #[must_use]
    pub fn hits(&self) -> &[HitReport] {
        match self {
            Self::OnCooldown => &[],
            Self::Resolved(hits) => hits,
        }
    }

    /// Checks whether the attack went off.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Mutable access to agents by ID.
pub trait AgentStore {
    /// Gets an agent.
    fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent>;
}

/// Applies area damage.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatResolver;

impl CombatResolver {
    /// Resolves one attack.
    ///
    /// Does nothing while `cooldown` has not elapsed. Otherwise every living
    /// agent other than the attacker inside the sphere takes
    /// `max(0, raw - defense)` damage, and the cooldown restarts at
    /// `ctx.now` whether or not anything was hit.
    pub fn resolve_attack<S>(
        attacker: AgentId,
        cooldown: &mut CooldownState,
        request: &AttackRequest,
        store: &mut S,
        ctx: &mut TickContext<'_>,
    ) -> AttackResolution
    where
        S: AgentStore + OverlapQuery,
    {
        if !cooldown.is_ready(ctx.now) {
            return AttackResolution::OnCooldown;
        }

        let mut candidates = store.overlap_sphere(request.origin, request.radius, request.mask);
        candidates.sort_unstable();
        candidates.dedup();

        let mut hits = Vec::new();
        for id in candidates {
            if id == attacker {
                continue;
            }
            let Some(target) = store.agent_mut(id) else {
                continue;
            };
            if target.body.is_dead {
                continue;
            }

            let outcome = target.receive_hit(request.raw_damage, ctx);
            if outcome.ignored {
                continue;
            }
            debug!(
                "{} hit {} for {:.1} ({:.1} left)",
                attacker, id, outcome.applied, outcome.health_after
            );
            hits.push(HitReport {
                target: id,
                damage: outcome.applied,
                health_after: outcome.health_after,
                killed: outcome.killed,
            });
        }

        cooldown.record(ctx.now);
        AttackResolution::Resolved(hits)
    }
}
