//! Zone progression.
//!
//! A level is an ordered list of zones. Each zone owns its spawners and is
//! complete once as many of their agents have been defeated as they spawn
//! in total. Completing the last zone completes the level.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gauntlet_common::{AgentId, SpawnerKey, ZoneId};

use crate::config::LevelDef;
use crate::events::{EventBus, GameEvent};
use crate::rng::SimRng;
use crate::spawner::{AgentFactory, SpawnerSignal, WaveSpawner};
use crate::timer::Countdown;

/// Lifecycle of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneState {
    /// Waiting to be started
    Locked,
    /// Spawning and counting defeats
    Active,
    /// Cleared; never reactivated
    Completed,
}

/// Flow notifications returned by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSignal {
    /// A zone became active
    ZoneStarted(ZoneId),
    /// A zone was cleared
    ZoneCompleted {
        /// Zone
        zone: ZoneId,
        /// Score for clearing it
        reward: u64,
        /// Glory for clearing it
        glory: u64,
    },
    /// The last zone was cleared
    LevelCompleted,
}

/// One zone and its spawners.
#[derive(Debug, Clone)]
pub struct Zone {
    id: ZoneId,
    name: String,
    reward: u64,
    glory: u64,
    spawners: Vec<WaveSpawner>,
    state: ZoneState,
    total_enemies: u32,
    defeated: u32,
}

impl Zone {
    /// Zone ID.
    #[must_use]
    pub const fn id(&self) -> ZoneId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ZoneState {
        self.state
    }

    /// Enemies that must be defeated, fixed when the zone is prepared.
    #[must_use]
    pub const fn total_enemies(&self) -> u32 {
        self.total_enemies
    }

    /// Enemies defeated so far.
    #[must_use]
    pub const fn defeated_count(&self) -> u32 {
        self.defeated
    }

    /// Spawners.
    #[must_use]
    pub fn spawners(&self) -> &[WaveSpawner] {
        &self.spawners
    }
}

/// Drives zones in order.
#[derive(Debug)]
pub struct StageOrchestrator {
    zones: Vec<Zone>,
    current: usize,
    prepared: Option<usize>,
    owners: ahash::AHashMap<AgentId, SpawnerKey>,
    auto_advance: bool,
    transition_delay: f32,
    transition: Option<Countdown>,
    level_complete: bool,
}

impl StageOrchestrator {
    /// Builds zones and spawners from a level definition.
    ///
    /// Spawners naming an archetype for which `is_known` is false are
    /// disabled.
    pub fn from_level(def: &LevelDef, is_known: impl Fn(&str) -> bool, rng: &mut SimRng) -> Self {
        let zones = def
            .zones
            .iter()
            .enumerate()
            .map(|(zi, zone)| {
                let id = ZoneId::new(zi as u16);
                let spawners = zone
                    .spawners
                    .iter()
                    .enumerate()
                    .map(|(si, spawner)| {
                        let key = SpawnerKey::new(id, si as u16);
                        let mut built = WaveSpawner::new(key, spawner.clone(), rng.fork());
                        if let Some(name) = spawner.archetype.as_deref() {
                            if built.is_enabled() && !is_known(name) {
                                built.disable(&format!("unknown archetype '{name}'"));
                            }
                        }
                        built
                    })
                    .collect();
                Zone {
                    id,
                    name: zone.name.clone(),
                    reward: zone.completion_reward,
                    glory: zone.glory_reward,
                    spawners,
                    state: ZoneState::Locked,
                    total_enemies: 0,
                    defeated: 0,
                }
            })
            .collect();

        Self {
            zones,
            current: 0,
            prepared: None,
            owners: ahash::AHashMap::new(),
            auto_advance: def.auto_advance,
            transition_delay: def.zone_transition_delay,
            transition: None,
            level_complete: false,
        }
    }

    /// Zones in order.
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Gets a zone.
    #[must_use]
    pub fn zone(&self, index: usize) -> Option<&Zone> {
        self.zones.get(index)
    }

    /// Index of the zone that is active or next in line.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// Checks whether every zone has been completed.
    #[must_use]
    pub const fn is_level_complete(&self) -> bool {
        self.level_complete
    }

    /// Checks whether the next zone is waiting for its transition delay.
    #[must_use]
    pub const fn is_in_transition(&self) -> bool {
        self.transition.is_some()
    }

    /// Spawner that produced an agent still alive.
    #[must_use]
    pub fn owner_of(&self, agent: AgentId) -> Option<SpawnerKey> {
        self.owners.get(&agent).copied()
    }

    /// Makes zone `index` the current one, resets its spawners and fixes
    /// its enemy total. Completed or active zones are left alone.
    pub fn prepare_zone(&mut self, index: usize) -> bool {
        let Some(zone) = self.zones.get_mut(index) else {
            warn!("Cannot prepare zone {index}: level has {} zones", self.zones.len());
            return false;
        };
        match zone.state {
            ZoneState::Completed => {
                warn!("Zone '{}' is already completed", zone.name);
                return false;
            },
            ZoneState::Active => {
                warn!("Zone '{}' is already active", zone.name);
                return false;
            },
            ZoneState::Locked => {},
        }

        for spawner in &mut zone.spawners {
            spawner.reset();
        }
        zone.total_enemies = zone.spawners.iter().map(WaveSpawner::total_to_spawn).sum();
        zone.defeated = 0;
        info!(
            "Prepared zone '{}' with {} enemies",
            zone.name, zone.total_enemies
        );

        self.current = index;
        self.prepared = Some(index);
        true
    }

    /// Activates the prepared zone and starts its spawners. A zone with
    /// nothing to defeat completes immediately.
    pub fn start_zone(&mut self, events: &EventBus) -> Vec<LevelSignal> {
        let mut signals = Vec::new();
        let Some(index) = self.prepared.take() else {
            warn!("start_zone called with no prepared zone");
            return signals;
        };
        let zone = &mut self.zones[index];

        zone.state = ZoneState::Active;
        for spawner in &mut zone.spawners {
            spawner.start();
        }
        info!("Zone '{}' started", zone.name);
        events.publish(GameEvent::ZoneStarted {
            zone: zone.id,
            total_enemies: zone.total_enemies,
        });
        signals.push(LevelSignal::ZoneStarted(zone.id));

        if zone.total_enemies == 0 {
            warn!("Zone '{}' has no enemies, completing", zone.name);
            self.complete_zone(index, events, &mut signals);
        }
        signals
    }

    /// Advances the transition delay and the active zone's spawners.
    pub fn tick(
        &mut self,
        dt: f32,
        factory: &mut dyn AgentFactory,
        events: &EventBus,
    ) -> Vec<LevelSignal> {
        let mut signals = Vec::new();

        if let Some(timer) = self.transition.as_mut() {
            if timer.tick(dt) {
                self.transition = None;
                if self.prepare_zone(self.current) {
                    signals.extend(self.start_zone(events));
                }
            }
        }

        let Some(zone) = self.zones.get_mut(self.current) else {
            return signals;
        };
        if zone.state != ZoneState::Active {
            return signals;
        }
        for spawner in &mut zone.spawners {
            let key = spawner.key();
            for signal in spawner.tick(dt, factory, events) {
                if let SpawnerSignal::Spawned(agent) = signal {
                    self.owners.insert(agent, key);
                }
            }
        }
        signals
    }

    /// Routes a defeat to the owning spawner and zone. Agents not produced
    /// by a spawner are ignored.
    pub fn on_agent_defeated(&mut self, agent: AgentId, events: &EventBus) -> Vec<LevelSignal> {
        let mut signals = Vec::new();
        let Some(key) = self.owners.remove(&agent) else {
            return signals;
        };
        let index = key.zone.index();
        let Some(zone) = self.zones.get_mut(index) else {
            return signals;
        };
        let Some(spawner) = zone.spawners.get_mut(usize::from(key.slot)) else {
            return signals;
        };
        if spawner.notify_defeated(agent, events).is_empty() {
            return signals;
        }
        if zone.state != ZoneState::Active {
            return signals;
        }

        zone.defeated = (zone.defeated + 1).min(zone.total_enemies);
        if zone.defeated >= zone.total_enemies {
            self.complete_zone(index, events, &mut signals);
        }
        signals
    }

    /// Stops every spawner; used when the run ends early.
    pub fn stop_all(&mut self) {
        self.transition = None;
        for spawner in self.zones.iter_mut().flat_map(|z| z.spawners.iter_mut()) {
            spawner.stop();
        }
    }

    fn complete_zone(&mut self, index: usize, events: &EventBus, signals: &mut Vec<LevelSignal>) {
        let zone = &mut self.zones[index];
        for spawner in &mut zone.spawners {
            spawner.stop();
        }
        zone.state = ZoneState::Completed;
        info!("Zone '{}' completed", zone.name);
        events.publish(GameEvent::ZoneCompleted { zone: zone.id });
        signals.push(LevelSignal::ZoneCompleted {
            zone: zone.id,
            reward: zone.reward,
            glory: zone.glory,
        });

        self.current = index + 1;
        if self.current >= self.zones.len() {
            self.level_complete = true;
            info!("Level completed");
            events.publish(GameEvent::LevelCompleted);
            signals.push(LevelSignal::LevelCompleted);
        } else if self.auto_advance {
            self.transition = Some(Countdown::new(self.transition_delay));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SpawnerDef, ZoneDef};
    use gauntlet_common::{AgentIdAllocator, Vec3};

    #[derive(Default)]
    struct MockFactory {
        ids: AgentIdAllocator,
        spawned: Vec<AgentId>,
    }

    impl AgentFactory for MockFactory {
        fn spawn(
            &mut self,
            _spawner: SpawnerKey,
            _archetype: &str,
            _position: Vec3,
        ) -> Option<AgentId> {
            let id = self.ids.next_id();
            self.spawned.push(id);
            Some(id)
        }
    }

    fn level(zones: Vec<ZoneDef>, auto_advance: bool) -> LevelDef {
        LevelDef {
            name: "test".to_string(),
            auto_advance,
            zone_transition_delay: 2.0,
            glory_reward: 0,
            zones,
        }
    }

    fn orchestrator(def: &LevelDef) -> StageOrchestrator {
        StageOrchestrator::from_level(def, |name| name != "ghost", &mut SimRng::with_seed(3))
    }

    fn spawn_all(
        o: &mut StageOrchestrator,
        factory: &mut MockFactory,
        bus: &EventBus,
    ) -> Vec<AgentId> {
        o.tick(0.0, factory, bus);
        factory.spawned.drain(..).collect()
    }

    #[test]
    fn test_prepare_sums_enabled_spawners() {
        let def = level(
            vec![ZoneDef::new(
                "a",
                vec![
                    SpawnerDef::new("grunt", 3, 3),
                    SpawnerDef::new("brute", 2, 1),
                    SpawnerDef::new("ghost", 4, 4),
                    SpawnerDef::default(),
                ],
            )],
            false,
        );
        let mut o = orchestrator(&def);
        assert!(o.prepare_zone(0));
        assert_eq!(o.zone(0).map(Zone::total_enemies), Some(5));
        assert!(!o.prepare_zone(3));
    }

    #[test]
    fn test_zone_completes_at_total_then_level() {
        let bus = EventBus::default();
        let mut factory = MockFactory::default();
        let def = level(
            vec![ZoneDef::new("only", vec![SpawnerDef::new("grunt", 2, 2)])],
            false,
        );
        let mut o = orchestrator(&def);
        o.prepare_zone(0);
        let started = o.start_zone(&bus);
        assert_eq!(started, vec![LevelSignal::ZoneStarted(ZoneId::new(0))]);

        let ids = spawn_all(&mut o, &mut factory, &bus);
        assert_eq!(ids.len(), 2);

        assert!(o.on_agent_defeated(ids[0], &bus).is_empty());
        assert!(o.on_agent_defeated(ids[0], &bus).is_empty());
        assert_eq!(o.zone(0).map(Zone::defeated_count), Some(1));

        let signals = o.on_agent_defeated(ids[1], &bus);
        assert_eq!(
            signals,
            vec![
                LevelSignal::ZoneCompleted {
                    zone: ZoneId::new(0),
                    reward: 0,
                    glory: 0,
                },
                LevelSignal::LevelCompleted
            ]
        );
        assert!(o.is_level_complete());
        assert_eq!(o.zone(0).map(Zone::state), Some(ZoneState::Completed));
        assert!(!o.prepare_zone(0));
    }

    #[test]
    fn test_empty_zone_completes_immediately() {
        let bus = EventBus::default();
        let def = level(
            vec![
                ZoneDef::new("empty", Vec::new()),
                ZoneDef::new("next", vec![SpawnerDef::new("grunt", 1, 1)]),
            ],
            true,
        );
        let mut o = orchestrator(&def);
        o.prepare_zone(0);
        let signals = o.start_zone(&bus);
        assert!(signals.contains(&LevelSignal::ZoneCompleted {
            zone: ZoneId::new(0),
            reward: 0,
            glory: 0,
        }));
        assert_eq!(o.current_index(), 1);
        assert!(o.is_in_transition());
    }

    #[test]
    fn test_auto_advance_after_delay() {
        let bus = EventBus::default();
        let mut factory = MockFactory::default();
        let def = level(
            vec![
                ZoneDef::new("first", vec![SpawnerDef::new("grunt", 1, 1)]),
                ZoneDef::new("second", vec![SpawnerDef::new("grunt", 1, 1)]),
            ],
            true,
        );
        let mut o = orchestrator(&def);
        o.prepare_zone(0);
        o.start_zone(&bus);
        let ids = spawn_all(&mut o, &mut factory, &bus);
        o.on_agent_defeated(ids[0], &bus);

        assert!(o.tick(1.0, &mut factory, &bus).is_empty());
        let signals = o.tick(1.0, &mut factory, &bus);
        assert_eq!(signals, vec![LevelSignal::ZoneStarted(ZoneId::new(1))]);
        assert_eq!(o.zone(1).map(Zone::state), Some(ZoneState::Active));
        assert_eq!(o.zone(0).map(Zone::state), Some(ZoneState::Completed));
    }

    #[test]
    fn test_double_start_is_ignored() {
        let bus = EventBus::default();
        let def = level(vec![ZoneDef::new("a", vec![SpawnerDef::new("grunt", 1, 1)])], false);
        let mut o = orchestrator(&def);
        o.prepare_zone(0);
        assert_eq!(o.start_zone(&bus).len(), 1);
        assert!(o.start_zone(&bus).is_empty());
        assert!(!o.prepare_zone(0));
    }

    #[test]
    fn test_unowned_defeat_ignored() {
        let bus = EventBus::default();
        let def = level(vec![ZoneDef::new("a", vec![SpawnerDef::new("grunt", 1, 1)])], false);
        let mut o = orchestrator(&def);
        o.prepare_zone(0);
        o.start_zone(&bus);
        assert!(o.on_agent_defeated(AgentId::from_raw(42), &bus).is_empty());
        assert_eq!(o.zone(0).map(Zone::defeated_count), Some(0));
    }
}
