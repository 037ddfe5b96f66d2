//! Agent bodies: role, stats, health and cooldowns.
//!
//! A [`Body`] is the plain data part of an agent. The state machine and the
//! behavior that drive it live next to it in [`crate::roster::Agent`].

use serde::{Deserialize, Serialize};

use gauntlet_common::{AgentId, Bounds2, LayerMask, Vec3};

/// Which side an agent fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Player-controlled character
    Player,
    /// Regular enemy
    Enemy,
    /// Boss with phase logic
    Boss,
}

impl Role {
    /// Collision layer agents of this role live on.
    #[must_use]
    pub const fn layer(self) -> LayerMask {
        match self {
            Self::Player => LayerMask::PLAYER,
            Self::Enemy => LayerMask::ENEMY,
            Self::Boss => LayerMask::BOSS,
        }
    }

    /// Layers this role's attacks can hit.
    #[must_use]
    pub fn hostile_layers(self) -> LayerMask {
        match self {
            Self::Player => LayerMask::ENEMY | LayerMask::BOSS,
            Self::Enemy | Self::Boss => LayerMask::PLAYER,
        }
    }
}

/// Capability flags queried at runtime instead of downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Boss-only flow (phase events, no slot use)
    pub is_boss: bool,
    /// Evaluates health thresholds when damaged
    pub has_phase_logic: bool,
    /// Can dash
    pub has_dash: bool,
    /// Enters Hit when damaged and still alive
    pub staggers: bool,
}

impl Capabilities {
    /// Default capabilities for a role.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Player | Role::Enemy => Self {
                is_boss: false,
                has_phase_logic: false,
                has_dash: false,
                staggers: true,
            },
            Role::Boss => Self {
                is_boss: true,
                has_phase_logic: true,
                has_dash: true,
                staggers: false,
            },
        }
    }
}

/// Base stats of an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    /// Maximum health
    pub max_health: f32,
    /// Flat damage reduction
    pub defense: f32,
    /// Damage dealt by a basic attack
    pub base_damage: f32,
    /// Movement speed in units per second
    pub move_speed: f32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            defense: 5.0,
            base_damage: 10.0,
            move_speed: 5.0,
        }
    }
}

impl Stats {
    /// Sets max health.
    #[must_use]
    pub fn with_health(mut self, max_health: f32) -> Self {
        self.max_health = max_health;
        self
    }

    /// Sets defense.
    #[must_use]
    pub fn with_defense(mut self, defense: f32) -> Self {
        self.defense = defense;
        self
    }

    /// Sets base damage.
    #[must_use]
    pub fn with_damage(mut self, base_damage: f32) -> Self {
        self.base_damage = base_damage;
        self
    }

    /// Sets move speed.
    #[must_use]
    pub fn with_speed(mut self, move_speed: f32) -> Self {
        self.move_speed = move_speed;
        self
    }
}

/// Attack cooldown bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CooldownState {
    /// Seconds between attacks
    pub cooldown: f32,
    /// Simulation time of the last resolved attack
    pub last_attack_time: Option<f64>,
}

impl CooldownState {
    /// Creates a ready cooldown.
    #[must_use]
    pub const fn new(cooldown: f32) -> Self {
        Self {
            cooldown,
            last_attack_time: None,
        }
    }

    /// Checks whether an attack may resolve at `now`.
    #[must_use]
    pub fn is_ready(&self, now: f64) -> bool {
        self.last_attack_time
            .map_or(true, |last| now >= last + f64::from(self.cooldown))
    }

    /// Seconds until ready.
    #[must_use]
    pub fn remaining(&self, now: f64) -> f32 {
        self.last_attack_time.map_or(0.0, |last| {
            ((last + f64::from(self.cooldown)) - now).max(0.0) as f32
        })
    }

    /// Starts the cooldown at `now`.
    pub fn record(&mut self, now: f64) {
        self.last_attack_time = Some(now);
    }
}

/// Which cooldown an attack request is gated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CooldownGate {
    /// Regular melee cooldown
    Melee,
    /// Dash contact strike, gated only by the dash's single-hit latch
    DashStrike,
    /// Player kick while airborne
    AirKick,
}

/// Result of applying raw damage to a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// Damage after defense
    pub applied: f32,
    /// Health before the hit
    pub health_before: f32,
    /// Health after the hit
    pub health_after: f32,
    /// This hit killed the body
    pub killed: bool,
    /// The body was already dead and nothing happened
    pub ignored: bool,
}

impl DamageOutcome {
    /// Health fraction before the hit.
    #[must_use]
    pub fn fraction_before(&self, max_health: f32) -> f32 {
        fraction(self.health_before, max_health)
    }

    /// Health fraction after the hit.
    #[must_use]
    pub fn fraction_after(&self, max_health: f32) -> f32 {
        fraction(self.health_after, max_health)
    }
}

fn fraction(health: f32, max_health: f32) -> f32 {
    if max_health <= 0.0 {
        0.0
    } else {
        (health / max_health).clamp(0.0, 1.0)
    }
}

/// Damage left after flat defense; never negative.
#[must_use]
pub fn mitigated_damage(raw: f32, defense: f32) -> f32 {
    (raw - defense).max(0.0)
}

/// Plain data of an agent.
#[derive(Debug, Clone)]
pub struct Body {
    /// Agent ID
    pub id: AgentId,
    /// Archetype name
    pub archetype: String,
    /// Role
    pub role: Role,
    /// Capability flags
    pub caps: Capabilities,
    /// Base stats
    pub stats: Stats,
    /// Current health
    pub health: f32,
    /// Position
    pub position: Vec3,
    /// Velocity, integrated by the arena after behavior updates
    pub velocity: Vec3,
    /// Set once, never cleared
    pub is_dead: bool,
    /// Slot held in the slot allocator
    pub assigned_slot: Option<usize>,
    /// Melee cooldown
    pub melee: CooldownState,
    /// Dash strike cooldown (zero length, latch-gated)
    pub dash_strike: CooldownState,
    /// Air kick cooldown
    pub air_kick: CooldownState,
    /// Movement bound applied while dashing
    pub dash_bounds: Option<Bounds2>,
    /// Seconds a dead body stays before removal
    pub removal_delay: f32,
    /// Score granted when defeated
    pub score_value: u64,
    /// Glory granted when defeated
    pub glory_value: u64,
}

impl Body {
    /// Creates a body at full health.
    #[must_use]
    pub fn new(id: AgentId, archetype: impl Into<String>, role: Role, stats: Stats) -> Self {
        Self {
            id,
            archetype: archetype.into(),
            role,
            caps: Capabilities::for_role(role),
            health: stats.max_health,
            stats,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            is_dead: false,
            assigned_slot: None,
            melee: CooldownState::new(1.0),
            dash_strike: CooldownState::new(0.0),
            air_kick: CooldownState::new(1.0),
            dash_bounds: None,
            removal_delay: 2.0,
            score_value: 0,
            glory_value: 0,
        }
    }

    /// Sets the spawn position.
    #[must_use]
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the melee cooldown.
    #[must_use]
    pub fn with_attack_cooldown(mut self, cooldown: f32) -> Self {
        self.melee = CooldownState::new(cooldown);
        self
    }

    /// Sets the air kick cooldown.
    #[must_use]
    pub fn with_air_kick_cooldown(mut self, cooldown: f32) -> Self {
        self.air_kick = CooldownState::new(cooldown);
        self
    }

    /// Overrides capability flags.
    #[must_use]
    pub fn with_caps(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Health as a fraction of max health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        fraction(self.health, self.stats.max_health)
    }

    /// Cooldown matching a gate.
    pub fn cooldown_mut(&mut self, gate: CooldownGate) -> &mut CooldownState {
        match gate {
            CooldownGate::Melee => &mut self.melee,
            CooldownGate::DashStrike => &mut self.dash_strike,
            CooldownGate::AirKick => &mut self.air_kick,
        }
    }

    /// Applies raw damage after defense. Dead bodies ignore damage.
    pub fn apply_damage(&mut self, raw: f32) -> DamageOutcome {
        let before = self.health;
        if self.is_dead {
            return DamageOutcome {
                applied: 0.0,
                health_before: before,
                health_after: before,
                killed: false,
                ignored: true,
            };
        }

        let applied = mitigated_damage(raw, self.stats.defense);
        self.health = (self.health - applied).max(0.0);
        let killed = self.health <= 0.0;
        if killed {
            self.is_dead = true;
        }

        DamageOutcome {
            applied,
            health_before: before,
            health_after: self.health,
            killed,
            ignored: false,
        }
    }

    /// Moves by velocity for `dt` seconds.
    pub fn integrate(&mut self, dt: f32, clamp_to: Option<Bounds2>) {
        self.position += self.velocity * dt;
        if let Some(bounds) = clamp_to {
            self.position = bounds.clamp(self.position);
        }
    }
}
