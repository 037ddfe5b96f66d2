//! The arena: one combat session.
//!
//! The arena owns every agent, the slot ring, the zone orchestrator, the
//! event bus and the clock, and advances them in a fixed order each tick:
//!
//! 1. agents, in ascending ID order (behavior update, attack resolution,
//!    movement)
//! 2. defeats, routed to the score and to the owning spawner and zone
//! 3. removal of dead agents whose grace period is over
//! 4. spawners of the active zone

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use gauntlet_common::{AgentId, AgentIdAllocator, ConfigError, SpawnerKey, Vec3};

use crate::agent::{DamageOutcome, Role};
use crate::combat::CombatResolver;
use crate::config::ArenaConfig;
use crate::events::{EventBus, GameEvent};
use crate::input::InputFrame;
use crate::physics::{FlatGround, GroundQuery};
use crate::rng::SimRng;
use crate::roster::{Agent, Roster};
use crate::score::Scoreboard;
use crate::slots::SlotAllocator;
use crate::spawner::AgentFactory;
use crate::stage::{LevelSignal, StageOrchestrator};
use crate::state::{TargetView, TickContext};

/// Outcome of the session so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Level not started
    NotStarted,
    /// Zones are running
    InProgress,
    /// Every zone cleared
    Victory,
    /// The player died
    Defeat,
}

/// Summary of the session for logs and tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    /// Ticks run
    pub tick: u64,
    /// Simulation time
    pub time: f64,
    /// Outcome so far
    pub status: RunStatus,
    /// Current zone index
    pub zone: usize,
    /// Score
    pub score: u64,
    /// Glory
    pub glory: u64,
    /// Enemies defeated
    pub kills: u32,
    /// Player health, if a player exists
    pub player_health: Option<f32>,
    /// Living enemies and bosses
    pub alive_enemies: usize,
    /// Boss phase, if a boss is alive
    pub boss_phase: Option<usize>,
}

/// Spawns archetypes into the roster on behalf of spawners.
struct RosterFactory<'a> {
    roster: &'a mut Roster,
    ids: &'a mut AgentIdAllocator,
    config: &'a ArenaConfig,
    events: &'a EventBus,
}

impl AgentFactory for RosterFactory<'_> {
    fn spawn(&mut self, spawner: SpawnerKey, archetype: &str, position: Vec3) -> Option<AgentId> {
        let def = self.config.archetype(archetype)?;
        let id = self.ids.next_id();
        self.roster.insert(Agent::from_archetype(id, def, position));
        debug!("{} spawned {} as {}", spawner, archetype, id);
        self.events.publish(GameEvent::AgentSpawned {
            agent: id,
            archetype: archetype.to_string(),
            spawner: Some(spawner),
            position,
        });
        Some(id)
    }
}

/// One combat session.
pub struct Arena {
    config: ArenaConfig,
    roster: Roster,
    ids: AgentIdAllocator,
    slots: SlotAllocator,
    orchestrator: StageOrchestrator,
    events: EventBus,
    rng: SimRng,
    ground: Box<dyn GroundQuery + Send>,
    now: f64,
    ticks: u64,
    player: Option<AgentId>,
    input: InputFrame,
    scoreboard: Scoreboard,
    status: RunStatus,
    defeated: Vec<AgentId>,
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("now", &self.now)
            .field("ticks", &self.ticks)
            .field("agents", &self.roster.len())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Arena {
    /// Builds an arena from a validated configuration.
    pub fn new(mut config: ArenaConfig) -> Result<Self, ConfigError> {
        config.clamp_ranges();
        config.validate()?;
        for problem in config.unknown_archetypes() {
            warn!("{problem}");
        }

        let mut rng = SimRng::with_seed(config.seed);
        let slots = SlotAllocator::new(config.slots, rng.fork());
        let orchestrator = StageOrchestrator::from_level(
            &config.level,
            |name| config.archetype(name).is_some(),
            &mut rng,
        );
        let events = EventBus::new(config.event_capacity);

        info!(
            "Arena ready: {} zones, seed {:#x}",
            config.level.zones.len(),
            config.seed
        );

        Ok(Self {
            config,
            roster: Roster::new(),
            ids: AgentIdAllocator::default(),
            slots,
            orchestrator,
            events,
            rng,
            ground: Box::new(FlatGround::default()),
            now: 0.0,
            ticks: 0,
            player: None,
            input: InputFrame::default(),
            scoreboard: Scoreboard::default(),
            status: RunStatus::NotStarted,
            defeated: Vec::new(),
        })
    }

    /// Replaces the ground query.
    #[must_use]
    pub fn with_ground(mut self, ground: impl GroundQuery + Send + 'static) -> Self {
        self.ground = Box::new(ground);
        self
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Simulation time in seconds.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now
    }

    /// Ticks run.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Every agent.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Gets an agent.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.roster.get(id)
    }

    /// The slot ring.
    #[must_use]
    pub const fn slots(&self) -> &SlotAllocator {
        &self.slots
    }

    /// Zone orchestrator.
    #[must_use]
    pub const fn orchestrator(&self) -> &StageOrchestrator {
        &self.orchestrator
    }

    /// Score so far.
    #[must_use]
    pub const fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Outcome so far.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Player ID, once spawned.
    #[must_use]
    pub const fn player_id(&self) -> Option<AgentId> {
        self.player
    }

    /// The player agent.
    #[must_use]
    pub fn player(&self) -> Option<&Agent> {
        self.player.and_then(|id| self.roster.get(id))
    }

    /// Living enemies and bosses.
    #[must_use]
    pub fn alive_enemies(&self) -> usize {
        self.roster.alive_count(Role::Enemy) + self.roster.alive_count(Role::Boss)
    }

    /// Sets the player input for the next tick.
    pub fn set_input(&mut self, frame: InputFrame) {
        self.input = frame;
    }

    /// Spawns the player at the configured position; returns the existing
    /// player if there already is one.
    pub fn spawn_player(&mut self) -> AgentId {
        if let Some(id) = self.player {
            if self.roster.contains(id) {
                return id;
            }
        }
        let id = self.ids.next_id();
        let position = self.config.player_spawn;
        self.roster
            .insert(Agent::from_archetype(id, &self.config.player, position));
        self.events.publish(GameEvent::AgentSpawned {
            agent: id,
            archetype: self.config.player.name.clone(),
            spawner: None,
            position,
        });
        info!("Player spawned as {}", id);
        self.player = Some(id);
        id
    }

    /// Spawns an archetype outside any spawner. Such agents do not count
    /// toward zone completion.
    pub fn spawn_archetype(&mut self, name: &str, position: Vec3) -> Option<AgentId> {
        let Some(def) = self.config.archetype(name) else {
            warn!("Unknown archetype '{name}'");
            return None;
        };
        let id = self.ids.next_id();
        self.roster.insert(Agent::from_archetype(id, def, position));
        self.events.publish(GameEvent::AgentSpawned {
            agent: id,
            archetype: name.to_string(),
            spawner: None,
            position,
        });
        Some(id)
    }

    /// Spawns the player if needed and starts the first zone.
    pub fn start(&mut self) -> Vec<LevelSignal> {
        self.spawn_player();
        if !self.orchestrator.prepare_zone(0) {
            return Vec::new();
        }
        self.start_zone()
    }

    /// Prepares a zone; see [`StageOrchestrator::prepare_zone`].
    pub fn prepare_zone(&mut self, index: usize) -> bool {
        self.orchestrator.prepare_zone(index)
    }

    /// Starts the prepared zone.
    pub fn start_zone(&mut self) -> Vec<LevelSignal> {
        let signals = self.orchestrator.start_zone(&self.events);
        if !signals.is_empty() && self.status == RunStatus::NotStarted {
            self.status = RunStatus::InProgress;
        }
        self.apply_signals(&signals);
        signals
    }

    /// Advances the session by `dt` seconds. After a defeat only corpses
    /// keep counting down.
    pub fn tick(&mut self, dt: f32) -> Vec<LevelSignal> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Vec::new();
        }
        self.now += f64::from(dt);
        self.ticks += 1;
        let input = std::mem::take(&mut self.input);

        for id in self.roster.ids() {
            let Some(mut agent) = self.roster.take(id) else {
                continue;
            };
            if self.status == RunStatus::Defeat && !agent.body.is_dead {
                agent.body.velocity = Vec3::ZERO;
                self.roster.insert(agent);
                continue;
            }
            let target = self.target_for(&agent);

            let mut ctx = TickContext {
                now: self.now,
                dt,
                target,
                input: if self.player == Some(id) {
                    input
                } else {
                    InputFrame::default()
                },
                grounded: self.ground.is_grounded(agent.body.position),
                slots: &mut self.slots,
                rng: &mut self.rng,
                events: &self.events,
                defeated: &mut self.defeated,
            };

            for request in agent.tick(&mut ctx) {
                let cooldown = agent.body.cooldown_mut(request.gate);
                let result = CombatResolver::resolve_attack(
                    id,
                    cooldown,
                    &request,
                    &mut self.roster,
                    &mut ctx,
                );
                if !result.hits().is_empty() {
                    debug!("{} landed {} hit(s)", id, result.hits().len());
                }
            }
            agent.integrate(dt);
            self.roster.insert(agent);
        }

        let mut signals = Vec::new();
        for id in std::mem::take(&mut self.defeated) {
            if self.player == Some(id) {
                warn!("Player defeated at t={:.2}", self.now);
                self.events.publish(GameEvent::PlayerDefeated { agent: id });
                self.status = RunStatus::Defeat;
                self.orchestrator.stop_all();
                continue;
            }
            let (score, glory) = self
                .roster
                .get(id)
                .map_or((0, 0), |a| (a.body.score_value, a.body.glory_value));
            self.scoreboard.record_kill(score, glory, &self.events);
            signals.extend(self.orchestrator.on_agent_defeated(id, &self.events));
        }

        for agent in self.roster.drain_removable() {
            self.slots.release_all_held_by(agent.id());
            self.events
                .publish(GameEvent::AgentRemoved { agent: agent.id() });
        }

        if self.status == RunStatus::InProgress {
            let mut factory = RosterFactory {
                roster: &mut self.roster,
                ids: &mut self.ids,
                config: &self.config,
                events: &self.events,
            };
            signals.extend(self.orchestrator.tick(dt, &mut factory, &self.events));
        }

        self.apply_signals(&signals);
        signals
    }

    /// Applies a hit from outside combat, such as a hazard or a tool.
    /// A resulting defeat is routed on the next tick.
    pub fn apply_hit(&mut self, target: AgentId, raw_damage: f32) -> Option<DamageOutcome> {
        let mut agent = self.roster.take(target)?;
        let mut ctx = TickContext {
            now: self.now,
            dt: 0.0,
            target: self.target_for(&agent),
            input: InputFrame::default(),
            grounded: self.ground.is_grounded(agent.body.position),
            slots: &mut self.slots,
            rng: &mut self.rng,
            events: &self.events,
            defeated: &mut self.defeated,
        };
        let outcome = agent.receive_hit(raw_damage, &mut ctx);
        self.roster.insert(agent);
        Some(outcome)
    }

    /// Drains pending events.
    pub fn drain_events(&self) -> Vec<GameEvent> {
        self.events.drain()
    }

    /// Summary of the session.
    #[must_use]
    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            tick: self.ticks,
            time: self.now,
            status: self.status,
            zone: self.orchestrator.current_index(),
            score: self.scoreboard.score(),
            glory: self.scoreboard.glory(),
            kills: self.scoreboard.kills(),
            player_health: self.player().map(|p| p.body.health),
            alive_enemies: self.alive_enemies(),
            boss_phase: self
                .roster
                .iter()
                .find(|a| a.body.caps.is_boss && !a.body.is_dead)
                .and_then(Agent::phase),
        }
    }

    fn target_for(&self, agent: &Agent) -> Option<TargetView> {
        if self.player == Some(agent.id()) {
            return Some(target_view(agent));
        }
        self.player
            .and_then(|p| self.roster.get(p))
            .map(target_view)
    }

    fn apply_signals(&mut self, signals: &[LevelSignal]) {
        for signal in signals {
            match *signal {
                LevelSignal::ZoneStarted(zone) => {
                    debug!("Zone {} running", zone.index());
                },
                LevelSignal::ZoneCompleted { reward, glory, .. } => {
                    self.scoreboard.record_zone(reward, glory, &self.events);
                },
                LevelSignal::LevelCompleted => {
                    if self.status != RunStatus::Defeat {
                        self.status = RunStatus::Victory;
                        self.scoreboard
                            .record_level(self.config.level.glory_reward, &self.events);
                    }
                },
            }
        }
    }
}

fn target_view(agent: &Agent) -> TargetView {
    TargetView {
        id: agent.id(),
        position: agent.body.position,
        is_dead: agent.body.is_dead,
    }
}
