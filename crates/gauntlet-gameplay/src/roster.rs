//! Agents and the roster that owns them.

use std::collections::BTreeMap;

use gauntlet_common::{AgentId, LayerMask, Vec3};

use crate::agent::{Body, DamageOutcome, Role};
use crate::behavior::{Behavior, BossBehavior, EnemyBehavior, PlayerBehavior};
use crate::combat::{AgentStore, AttackRequest};
use crate::config::ArchetypeDef;
use crate::events::GameEvent;
use crate::physics::OverlapQuery;
use crate::state::{State, StateKind, StateMachine, TickContext};

/// Radius of every agent's collider.
pub const COLLIDER_RADIUS: f32 = 0.5;

/// A body, its state machine and the behavior that drives it.
#[derive(Debug)]
pub struct Agent {
    /// Plain data
    pub body: Body,
    /// State machine
    pub fsm: StateMachine,
    behavior: Box<dyn Behavior>,
}

impl Agent {
    /// Creates an agent; its initial state is entered on the first tick.
    #[must_use]
    pub fn new(body: Body, behavior: Box<dyn Behavior>) -> Self {
        let fsm = StateMachine::new(behavior.initial_state());
        Self {
            body,
            fsm,
            behavior,
        }
    }

    /// Builds an agent from an archetype.
    #[must_use]
    pub fn from_archetype(id: AgentId, def: &ArchetypeDef, position: Vec3) -> Self {
        let mut body = Body::new(id, def.name.clone(), def.role, def.stats)
            .at(position)
            .with_attack_cooldown(def.attack_cooldown())
            .with_air_kick_cooldown(def.player.air_kick_cooldown);
        body.removal_delay = def.removal_delay;
        body.score_value = def.score_value;
        body.glory_value = def.glory_value;

        let behavior: Box<dyn Behavior> = match def.role {
            Role::Player => Box::new(PlayerBehavior::new(def.player)),
            Role::Enemy => Box::new(EnemyBehavior::new(def.ai)),
            Role::Boss => {
                body.dash_bounds = Some(def.boss.bounds);
                Box::new(BossBehavior::new(def.ai, def.boss.clone()))
            },
        };
        Self::new(body, behavior)
    }

    /// Agent ID.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.body.id
    }

    /// Boss phase, if the behavior has one.
    #[must_use]
    pub fn phase(&self) -> Option<usize> {
        self.behavior.phase()
    }

    /// Runs one tick and returns the attacks to resolve.
    ///
    /// Dead agents only count down to removal. Agents that need a target
    /// idle while there is none.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> Vec<AttackRequest> {
        if self.body.is_dead {
            if !self.fsm.is_dead() {
                let dead = State::dead(self.body.removal_delay);
                self.fsm.change_state(&mut self.body, dead, ctx);
            }
            if let State::Dead { removal } = self.fsm.state_mut() {
                removal.tick(ctx.dt);
            }
            return Vec::new();
        }

        if self.behavior.needs_target() && ctx.living_target().is_none() {
            if !self.fsm.is_started() || self.fsm.kind() != StateKind::Idle {
                self.fsm.change_state(&mut self.body, State::Idle, ctx);
            }
            self.body.velocity = Vec3::ZERO;
            return Vec::new();
        }

        self.fsm.start(&mut self.body, ctx);
        self.behavior.update(&mut self.body, &mut self.fsm, ctx)
    }

    /// Applies a hit. Lethal hits move the agent to Dead exactly once.
    pub fn receive_hit(&mut self, raw_damage: f32, ctx: &mut TickContext<'_>) -> DamageOutcome {
        let outcome = self.body.apply_damage(raw_damage);
        if outcome.ignored {
            return outcome;
        }

        ctx.events.publish(GameEvent::HealthChanged {
            agent: self.body.id,
            health: self.body.health,
            max_health: self.body.stats.max_health,
        });
        self.behavior
            .on_damaged(&mut self.body, &mut self.fsm, &outcome, ctx);

        if outcome.killed {
            let dead = State::dead(self.body.removal_delay);
            self.fsm.change_state(&mut self.body, dead, ctx);
        }
        outcome
    }

    /// Moves by velocity; dashes are clamped to the dash bound.
    pub fn integrate(&mut self, dt: f32) {
        let clamp = if self.fsm.kind() == StateKind::Dash {
            self.body.dash_bounds
        } else {
            None
        };
        self.body.integrate(dt, clamp);
    }

    /// Checks whether the agent is dead and its grace period is over.
    #[must_use]
    pub fn is_removable(&self) -> bool {
        match self.fsm.state() {
            State::Dead { removal } => removal.is_elapsed(),
            _ => false,
        }
    }
}

/// Every agent in the arena, ordered by ID.
#[derive(Debug, Default)]
pub struct Roster {
    agents: BTreeMap<AgentId, Agent>,
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of agents, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Checks whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Adds or replaces an agent.
    pub fn insert(&mut self, agent: Agent) {
        self.agents.insert(agent.id(), agent);
    }

    /// Removes an agent.
    pub fn take(&mut self, id: AgentId) -> Option<Agent> {
        self.agents.remove(&id)
    }

    /// Gets an agent.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Gets an agent mutably.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Checks whether an agent is present.
    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// IDs in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    /// Iterates over agents in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Living agents with the given role.
    #[must_use]
    pub fn alive_count(&self, role: Role) -> usize {
        self.agents
            .values()
            .filter(|a| a.body.role == role && !a.body.is_dead)
            .count()
    }

    /// Removes and returns agents whose grace period is over.
    pub fn drain_removable(&mut self) -> Vec<Agent> {
        let expired: Vec<AgentId> = self
            .agents
            .values()
            .filter(|a| a.is_removable())
            .map(Agent::id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.agents.remove(&id))
            .collect()
    }
}

impl AgentStore for Roster {
    fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }
}

impl OverlapQuery for Roster {
    fn overlap_sphere(&self, point: Vec3, radius: f32, mask: LayerMask) -> Vec<AgentId> {
        self.agents
            .values()
            .filter(|a| mask.intersects(a.body.role.layer()))
            .filter(|a| a.body.position.distance(point) <= radius + COLLIDER_RADIUS)
            .map(Agent::id)
            .collect()
    }
}
