//! Arena configuration.
//!
//! Archetypes (stats plus behavior tuning), the slot ring and the level
//! layout are plain data loaded from TOML. Anything missing falls back to
//! defaults.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gauntlet_common::{Bounds2, ConfigError, GauntletError, GauntletResult, Vec3};

use crate::agent::{Role, Stats};
use crate::behavior::BossStep;
use crate::slots::SlotConfig;

/// Tuning shared by enemy and boss AI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Beyond this distance the target is ignored
    pub detection_radius: f32,
    /// Distance at which attacks land
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Chance per second of closing in while circling
    pub approach_chance: f32,
    /// Scale applied to `approach_chance * dt`
    pub approach_scale: f32,
    /// Stagger duration
    pub hit_duration: f32,
    /// Seconds between slot re-requests while circling
    pub slot_change_interval: f32,
    /// Distance at which a slot counts as reached
    pub arrive_distance: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            detection_radius: 10.0,
            attack_range: 2.0,
            attack_cooldown: 1.5,
            approach_chance: 0.3,
            approach_scale: 5.0,
            hit_duration: 0.5,
            slot_change_interval: 3.0,
            arrive_distance: 0.2,
        }
    }
}

/// Boss-only tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    /// Health fractions, strictly decreasing in (0, 1)
    pub phase_thresholds: Vec<f32>,
    /// Dash speed
    pub dash_force: f32,
    /// Dash length in seconds
    pub dash_duration: f32,
    /// Seconds between dashes
    pub dash_cooldown: f32,
    /// Contact distance for strikes and dash hits
    pub strike_distance: f32,
    /// Give up searching or closing in after this long
    pub search_timeout: f32,
    /// Movement bound while dashing
    pub bounds: Bounds2,
    /// Each phase shortens waits and the dash cooldown by this fraction
    pub phase_speedup: f32,
    /// Step patterns; phase `n` uses entry `min(n, len - 1)`
    pub patterns: Vec<Vec<BossStep>>,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            phase_thresholds: vec![0.75, 0.5, 0.25],
            dash_force: 20.0,
            dash_duration: 1.0,
            dash_cooldown: 6.0,
            strike_distance: 1.0,
            search_timeout: 5.0,
            bounds: Bounds2::default(),
            phase_speedup: 0.15,
            patterns: vec![
                vec![
                    BossStep::Wait(1.5),
                    BossStep::Search,
                    BossStep::Strike,
                    BossStep::Wait(1.0),
                    BossStep::Search,
                    BossStep::Dash,
                ],
                vec![
                    BossStep::Wait(1.0),
                    BossStep::Search,
                    BossStep::Strike,
                    BossStep::Dash,
                    BossStep::Search,
                    BossStep::Strike,
                ],
                vec![
                    BossStep::Wait(0.5),
                    BossStep::Search,
                    BossStep::Dash,
                    BossStep::Search,
                    BossStep::Strike,
                    BossStep::Search,
                    BossStep::Strike,
                ],
            ],
        }
    }
}

/// Player-only tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Attack sphere radius
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Length of the attack pose
    pub attack_window: f32,
    /// Speed multiplier while running
    pub run_multiplier: f32,
    /// Seconds in the air per jump
    pub jump_duration: f32,
    /// Seconds between air kicks
    pub air_kick_cooldown: f32,
    /// Stagger duration
    pub hit_duration: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            attack_range: 1.5,
            attack_cooldown: 1.0,
            attack_window: 0.2,
            run_multiplier: 1.8,
            jump_duration: 0.6,
            air_kick_cooldown: 0.8,
            hit_duration: 0.5,
        }
    }
}

/// A spawnable kind of agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeDef {
    /// Unique name referenced by spawners
    pub name: String,
    /// Role
    pub role: Role,
    /// Base stats
    pub stats: Stats,
    /// Score for defeating it
    pub score_value: u64,
    /// Glory for defeating it
    pub glory_value: u64,
    /// Seconds a corpse stays before removal
    pub removal_delay: f32,
    /// AI tuning (enemies and bosses)
    pub ai: AiTuning,
    /// Boss tuning (bosses only)
    pub boss: BossTuning,
    /// Player tuning (player only)
    pub player: PlayerTuning,
}

impl Default for ArchetypeDef {
    fn default() -> Self {
        Self {
            name: "grunt".to_string(),
            role: Role::Enemy,
            stats: Stats::default(),
            score_value: 100,
            glory_value: 0,
            removal_delay: 2.0,
            ai: AiTuning::default(),
            boss: BossTuning::default(),
            player: PlayerTuning::default(),
        }
    }
}

impl ArchetypeDef {
    /// Creates an archetype with default tuning.
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role, stats: Stats) -> Self {
        Self {
            name: name.into(),
            role,
            stats,
            ..Self::default()
        }
    }

    /// Sets the score value.
    #[must_use]
    pub fn with_score(mut self, score: u64) -> Self {
        self.score_value = score;
        self
    }

    /// Sets the glory value.
    #[must_use]
    pub fn with_glory(mut self, glory: u64) -> Self {
        self.glory_value = glory;
        self
    }

    /// Sets AI tuning.
    #[must_use]
    pub fn with_ai(mut self, ai: AiTuning) -> Self {
        self.ai = ai;
        self
    }

    /// Sets boss tuning.
    #[must_use]
    pub fn with_boss(mut self, boss: BossTuning) -> Self {
        self.boss = boss;
        self
    }

    /// Seconds between melee attacks for this archetype.
    #[must_use]
    pub fn attack_cooldown(&self) -> f32 {
        match self.role {
            Role::Player => self.player.attack_cooldown,
            Role::Enemy | Role::Boss => self.ai.attack_cooldown,
        }
    }
}

/// One spawner in a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerDef {
    /// Name used in logs
    pub name: String,
    /// Archetype to spawn; a spawner without one is disabled
    pub archetype: Option<String>,
    /// Agents this spawner produces in total
    pub total_to_spawn: u32,
    /// Cap on simultaneously alive agents
    pub max_alive: u32,
    /// Seconds between spawn passes
    pub spawn_interval: f32,
    /// Seconds before the first pass
    pub initial_delay: f32,
    /// Center used when there are no spawn points
    pub origin: Vec3,
    /// Explicit spawn points, picked at random
    pub spawn_points: Vec<Vec3>,
    /// Random horizontal jitter around the chosen point
    pub spawn_radius: f32,
    /// Switch the spawner off without deleting it
    pub enabled: bool,
}

impl Default for SpawnerDef {
    fn default() -> Self {
        Self {
            name: "spawner".to_string(),
            archetype: None,
            total_to_spawn: 5,
            max_alive: 3,
            spawn_interval: 2.0,
            initial_delay: 0.0,
            origin: Vec3::ZERO,
            spawn_points: Vec::new(),
            spawn_radius: 1.0,
            enabled: true,
        }
    }
}

impl SpawnerDef {
    /// Spawner producing `total` agents of an archetype, `max_alive` at a time.
    #[must_use]
    pub fn new(archetype: impl Into<String>, total: u32, max_alive: u32) -> Self {
        let archetype = archetype.into();
        Self {
            name: format!("{archetype}-spawner"),
            archetype: Some(archetype),
            total_to_spawn: total,
            max_alive,
            ..Self::default()
        }
    }

    /// Sets the center.
    #[must_use]
    pub fn at(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the pass interval.
    #[must_use]
    pub fn with_interval(mut self, seconds: f32) -> Self {
        self.spawn_interval = seconds;
        self
    }

    /// Sets the first pass delay.
    #[must_use]
    pub fn with_initial_delay(mut self, seconds: f32) -> Self {
        self.initial_delay = seconds;
        self
    }

    /// Sets the jitter radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.spawn_radius = radius;
        self
    }
}

/// One zone of a level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneDef {
    /// Display name
    pub name: String,
    /// Score granted on completion
    pub completion_reward: u64,
    /// Glory granted on completion
    pub glory_reward: u64,
    /// Spawners
    pub spawners: Vec<SpawnerDef>,
}

impl ZoneDef {
    /// Creates a zone.
    #[must_use]
    pub fn new(name: impl Into<String>, spawners: Vec<SpawnerDef>) -> Self {
        Self {
            name: name.into(),
            completion_reward: 0,
            glory_reward: 0,
            spawners,
        }
    }
}

/// Ordered list of zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDef {
    /// Display name
    pub name: String,
    /// Start the next zone automatically after a completion
    pub auto_advance: bool,
    /// Pause between a completion and the next zone
    pub zone_transition_delay: f32,
    /// Glory granted when the last zone is cleared
    pub glory_reward: u64,
    /// Zones in order
    pub zones: Vec<ZoneDef>,
}

impl Default for LevelDef {
    fn default() -> Self {
        Self {
            name: "Gauntlet".to_string(),
            auto_advance: true,
            zone_transition_delay: 2.0,
            glory_reward: 0,
            zones: Vec::new(),
        }
    }
}

/// Everything an arena is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Seed for every random decision
    pub seed: u64,
    /// Event bus capacity
    pub event_capacity: usize,
    /// Player spawn position
    pub player_spawn: Vec3,
    /// Slot ring
    pub slots: SlotConfig,
    /// The player archetype
    pub player: ArchetypeDef,
    /// Enemy and boss archetypes
    pub archetypes: Vec<ArchetypeDef>,
    /// Level layout
    pub level: LevelDef,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        let player = ArchetypeDef::new(
            "player",
            Role::Player,
            Stats::default().with_health(200.0).with_damage(25.0),
        )
        .with_score(0);

        let grunt = ArchetypeDef::new(
            "grunt",
            Role::Enemy,
            Stats::default()
                .with_health(30.0)
                .with_defense(2.0)
                .with_damage(8.0)
                .with_speed(3.5),
        );
        let brute = ArchetypeDef::new(
            "brute",
            Role::Enemy,
            Stats::default()
                .with_health(60.0)
                .with_defense(5.0)
                .with_damage(14.0)
                .with_speed(2.5),
        )
        .with_score(250)
        .with_ai(AiTuning {
            attack_cooldown: 2.0,
            ..AiTuning::default()
        });
        let warden = ArchetypeDef::new(
            "warden",
            Role::Boss,
            Stats::default()
                .with_health(500.0)
                .with_defense(10.0)
                .with_damage(30.0)
                .with_speed(3.0),
        )
        .with_score(2000)
        .with_glory(200)
        .with_ai(AiTuning {
            detection_radius: 30.0,
            attack_range: 5.0,
            attack_cooldown: 2.0,
            ..AiTuning::default()
        });

        let level = LevelDef {
            zones: vec![
                ZoneDef {
                    name: "Courtyard".to_string(),
                    completion_reward: 500,
                    glory_reward: 50,
                    spawners: vec![SpawnerDef::new("grunt", 5, 2).at(Vec3::new(8.0, 0.0, 0.0))],
                },
                ZoneDef {
                    name: "Barracks".to_string(),
                    completion_reward: 750,
                    glory_reward: 50,
                    spawners: vec![
                        SpawnerDef::new("grunt", 4, 2).at(Vec3::new(-8.0, 0.0, 4.0)),
                        SpawnerDef::new("brute", 2, 1)
                            .at(Vec3::new(8.0, 0.0, -4.0))
                            .with_initial_delay(3.0),
                    ],
                },
                ZoneDef {
                    name: "Throne".to_string(),
                    completion_reward: 1500,
                    glory_reward: 50,
                    spawners: vec![SpawnerDef::new("warden", 1, 1)
                        .at(Vec3::new(0.0, 0.0, 4.0))
                        .with_radius(0.0)],
                },
            ],
            glory_reward: 100,
            ..LevelDef::default()
        };

        Self {
            seed: 0x6A17_1E7,
            event_capacity: 4096,
            player_spawn: Vec3::ZERO,
            slots: SlotConfig::default(),
            player,
            archetypes: vec![grunt, brute, warden],
            level,
        }
    }
}

impl ArenaConfig {
    /// Parses TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serializes to TOML text.
    pub fn to_toml_string(&self) -> GauntletResult<String> {
        toml::to_string_pretty(self).map_err(|e| GauntletError::Serialization(e.to_string()))
    }

    /// Reads and parses a config file.
    pub fn read_from<P: AsRef<Path>>(path: P) -> GauntletResult<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&contents)?)
    }

    /// Loads configuration from a file, falling back to defaults when the
    /// file is missing or unreadable.
    #[must_use]
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::read_from(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("{e}, using defaults");
                Self::default()
            },
        }
    }

    /// Saves configuration to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> GauntletResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = self.to_toml_string()?;
        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamps tuning values into sensible ranges.
    pub fn clamp_ranges(&mut self) {
        self.event_capacity = self.event_capacity.clamp(64, 1 << 20);
        self.slots.max_slots = self.slots.max_slots.clamp(1, 64);
        self.slots.radius = self.slots.radius.clamp(0.5, 50.0);
        self.level.zone_transition_delay = self.level.zone_transition_delay.clamp(0.0, 60.0);

        for def in std::iter::once(&mut self.player).chain(self.archetypes.iter_mut()) {
            def.ai.approach_chance = def.ai.approach_chance.clamp(0.0, 1.0);
            def.removal_delay = def.removal_delay.clamp(0.0, 30.0);
            def.boss.phase_speedup = def.boss.phase_speedup.clamp(0.0, 0.9);
        }
        for spawner in self
            .level
            .zones
            .iter_mut()
            .flat_map(|zone| zone.spawners.iter_mut())
        {
            spawner.spawn_interval = spawner.spawn_interval.max(0.0);
            spawner.initial_delay = spawner.initial_delay.max(0.0);
            spawner.spawn_radius = spawner.spawn_radius.max(0.0);
        }
    }

    /// Checks for errors that make the configuration unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slots.max_slots == 0 {
            return Err(ConfigError::out_of_range("slots.max_slots", 0));
        }
        if self.slots.radius <= 0.0 {
            return Err(ConfigError::out_of_range("slots.radius", self.slots.radius));
        }
        if self.player.role != Role::Player {
            return Err(ConfigError::out_of_range("player.role", format!("{:?}", self.player.role)));
        }

        let mut seen = ahash::AHashSet::new();
        seen.insert(self.player.name.as_str());
        for def in &self.archetypes {
            if !seen.insert(def.name.as_str()) {
                return Err(ConfigError::DuplicateArchetype(def.name.clone()));
            }
            if def.role == Role::Player {
                return Err(ConfigError::out_of_range(
                    format!("archetypes.{}.role", def.name),
                    "player",
                ));
            }
        }

        for def in std::iter::once(&self.player).chain(self.archetypes.iter()) {
            validate_archetype(def)?;
        }

        for zone in &self.level.zones {
            for spawner in &zone.spawners {
                if spawner.max_alive == 0 && spawner.total_to_spawn > 0 {
                    return Err(ConfigError::out_of_range(
                        format!("{}.max_alive", spawner.name),
                        spawner.max_alive,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Spawners that name an archetype that does not exist. Such spawners
    /// are disabled rather than rejected.
    #[must_use]
    pub fn unknown_archetypes(&self) -> Vec<ConfigError> {
        self.level
            .zones
            .iter()
            .flat_map(|zone| zone.spawners.iter())
            .filter_map(|spawner| {
                let name = spawner.archetype.as_deref()?;
                if self.archetype(name).is_some() {
                    None
                } else {
                    Some(ConfigError::UnknownArchetype {
                        spawner: spawner.name.clone(),
                        archetype: name.to_string(),
                    })
                }
            })
            .collect()
    }

    /// Finds an enemy or boss archetype by name.
    #[must_use]
    pub fn archetype(&self, name: &str) -> Option<&ArchetypeDef> {
        self.archetypes.iter().find(|def| def.name == name)
    }
}

fn validate_archetype(def: &ArchetypeDef) -> Result<(), ConfigError> {
    if def.stats.max_health <= 0.0 {
        return Err(ConfigError::out_of_range(
            format!("{}.stats.max_health", def.name),
            def.stats.max_health,
        ));
    }
    if def.stats.defense < 0.0 {
        return Err(ConfigError::out_of_range(
            format!("{}.stats.defense", def.name),
            def.stats.defense,
        ));
    }
    if def.role == Role::Boss {
        validate_thresholds(&def.name, &def.boss.phase_thresholds)?;
        if def.boss.patterns.iter().all(Vec::is_empty) {
            return Err(ConfigError::out_of_range(
                format!("{}.boss.patterns", def.name),
                "empty",
            ));
        }
    }
    Ok(())
}

/// Checks that thresholds are strictly decreasing and inside (0, 1).
pub fn validate_thresholds(archetype: &str, thresholds: &[f32]) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidPhaseThresholds {
        archetype: archetype.to_string(),
        reason,
    };

    for (i, t) in thresholds.iter().enumerate() {
        if !(*t > 0.0 && *t < 1.0) {
            return Err(invalid(format!("threshold {i} ({t}) is outside (0, 1)")));
        }
        if i > 0 && thresholds[i - 1] <= *t {
            return Err(invalid(format!(
                "threshold {i} ({t}) is not below {}",
                thresholds[i - 1]
            )));
        }
    }
    Ok(())
}
