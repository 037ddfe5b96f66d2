//! End-to-end scenarios for the combat core.
//!
//! These drive a full [`Arena`] the way a game loop would and check the
//! observable outcome: agents, events, score and run status.

#![cfg(test)]

use gauntlet_common::{AgentId, Vec3};

use crate::agent::Role;
use crate::arena::{Arena, RunStatus};
use crate::config::{ArenaConfig, LevelDef, SpawnerDef, ZoneDef};
use crate::events::GameEvent;
use crate::input::InputFrame;
use crate::state::StateKind;

fn living(arena: &Arena) -> Vec<AgentId> {
    arena
        .roster()
        .iter()
        .filter(|a| a.body.role != Role::Player && !a.body.is_dead)
        .map(|a| a.id())
        .collect()
}

fn kill_all(arena: &mut Arena) {
    for id in living(arena) {
        arena.apply_hit(id, 10_000.0);
    }
}

fn spawned_by_spawners(events: &[GameEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, GameEvent::AgentSpawned { spawner: Some(_), .. }))
        .count()
}

/// Waves and spawner caps
mod wave_tests {
    use super::*;

    #[test]
    fn e2e_spawner_respects_cap_until_total() {
        let config = ArenaConfig {
            level: LevelDef {
                zones: vec![ZoneDef::new(
                    "yard",
                    vec![SpawnerDef::new("grunt", 5, 2)
                        .at(Vec3::new(8.0, 0.0, 0.0))
                        .with_interval(2.0)],
                )],
                ..LevelDef::default()
            },
            ..ArenaConfig::default()
        };
        let reward = config.level.zones[0].completion_reward;
        let mut arena = Arena::new(config).expect("arena");
        arena.start();

        let mut events = Vec::new();
        // (agents spawned, alive afterwards) for every tick that spawned
        let mut batches = Vec::new();
        let mut spawned = 0;
        for _ in 0..400 {
            arena.tick(0.1);
            let batch = arena.drain_events();
            let spawned_now = spawned_by_spawners(&batch);
            let alive = arena.alive_enemies();
            assert!(alive <= 2, "never more than max_alive at once");
            if spawned_now > 0 {
                spawned += spawned_now;
                batches.push((spawned_now, alive));
            }
            events.extend(batch);
            if arena.status() == RunStatus::Victory {
                break;
            }

            // One kill at a time while at the cap, then drain the rest.
            if alive == 2 || spawned == 5 {
                if let Some(&id) = living(&arena).first() {
                    arena.apply_hit(id, 10_000.0);
                }
            }
        }

        assert_eq!(arena.status(), RunStatus::Victory);
        assert_eq!(batches, vec![(2, 2), (1, 2), (1, 2), (1, 2)]);
        assert_eq!(spawned_by_spawners(&events), 5);
        assert_eq!(arena.scoreboard().kills(), 5);
        assert_eq!(arena.scoreboard().score(), 5 * 100 + reward);
        assert!(events.contains(&GameEvent::LevelCompleted));
    }

    #[test]
    fn e2e_full_level_clears_every_zone() {
        let mut arena = Arena::new(ArenaConfig::default()).expect("arena");
        arena.start();

        let mut events = Vec::new();
        for _ in 0..1500 {
            arena.tick(0.1);
            kill_all(&mut arena);
            events.extend(arena.drain_events());
            if arena.status() == RunStatus::Victory {
                break;
            }
        }

        assert_eq!(arena.status(), RunStatus::Victory);
        assert!(arena.orchestrator().is_level_complete());
        assert_eq!(arena.scoreboard().zones_cleared(), 3);
        assert_eq!(arena.scoreboard().kills(), 12);
        // 9 grunts, 2 brutes, 1 warden, then three zone rewards
        assert_eq!(arena.scoreboard().score(), 900 + 500 + 2000 + 500 + 750 + 1500);
        // Warden, three zones, then the level
        assert_eq!(arena.scoreboard().glory(), 200 + 3 * 50 + 100);
        assert_eq!(arena.snapshot().glory, 450);

        let started = events
            .iter()
            .filter(|e| matches!(e, GameEvent::ZoneStarted { .. }))
            .count();
        assert_eq!(started, 3);
    }

    #[test]
    fn e2e_player_defeat_stops_spawning() {
        let mut arena = Arena::new(ArenaConfig::default()).expect("arena");
        let player = arena.spawn_player();
        arena.start();
        arena.tick(0.1);

        arena.apply_hit(player, 10_000.0);
        arena.tick(0.1);
        assert_eq!(arena.status(), RunStatus::Defeat);
        let events = arena.drain_events();
        assert!(events.contains(&GameEvent::PlayerDefeated { agent: player }));

        for _ in 0..100 {
            arena.tick(0.1);
            kill_all(&mut arena);
        }
        let later = arena.drain_events();
        assert_eq!(spawned_by_spawners(&later), 0);
        assert_eq!(arena.status(), RunStatus::Defeat);
    }
}

/// Slot ring around the player
mod slot_tests {
    use super::*;

    #[test]
    fn e2e_ninth_enemy_gets_no_slot() {
        let mut config = ArenaConfig::default();
        for def in &mut config.archetypes {
            def.ai.approach_chance = 0.0;
        }
        let mut arena = Arena::new(config).expect("arena");
        arena.spawn_player();

        let enemies: Vec<AgentId> = (0..9)
            .filter_map(|i| {
                let angle = i as f32 * 0.7;
                let at = Vec3::new(angle.cos() * 6.0, 0.0, angle.sin() * 6.0);
                arena.spawn_archetype("grunt", at)
            })
            .collect();
        assert_eq!(enemies.len(), 9);

        arena.tick(0.1);

        assert_eq!(arena.slots().occupied_count(), 8);
        let without: Vec<AgentId> = enemies
            .iter()
            .copied()
            .filter(|id| arena.agent(*id).is_some_and(|a| a.body.assigned_slot.is_none()))
            .collect();
        assert_eq!(without, vec![enemies[8]]);
    }
}

/// Melee timing and damage
mod combat_tests {
    use super::*;

    fn health(arena: &Arena, id: AgentId) -> f32 {
        arena.agent(id).map_or(0.0, |a| a.body.health)
    }

    #[test]
    fn e2e_player_attack_respects_cooldown() {
        let mut arena = Arena::new(ArenaConfig::default()).expect("arena");
        arena.spawn_player();
        let grunt = arena
            .spawn_archetype("grunt", Vec3::new(1.0, 0.0, 0.0))
            .expect("grunt");

        // 25 damage against 2 defense
        arena.set_input(InputFrame::attacking());
        arena.tick(0.25);
        assert_eq!(health(&arena, grunt), 7.0);

        // Half a second later the one-second cooldown still holds
        for _ in 0..3 {
            arena.set_input(InputFrame::attacking());
            arena.tick(0.25);
            assert_eq!(health(&arena, grunt), 7.0);
        }

        arena.set_input(InputFrame::attacking());
        arena.tick(0.25);
        assert!(arena.agent(grunt).is_some_and(|a| a.body.is_dead));
        assert_eq!(arena.scoreboard().kills(), 1);
    }

    #[test]
    fn e2e_air_kick_lands_without_ground_cooldown() {
        let mut arena = Arena::new(ArenaConfig::default()).expect("arena");
        arena.spawn_player();
        let grunt = arena
            .spawn_archetype("grunt", Vec3::new(1.0, 0.0, 0.0))
            .expect("grunt");

        arena.set_input(InputFrame {
            jump: true,
            ..InputFrame::default()
        });
        arena.tick(0.1);
        assert_eq!(health(&arena, grunt), 30.0);

        arena.set_input(InputFrame::attacking());
        arena.tick(0.1);
        assert_eq!(health(&arena, grunt), 7.0);

        let player = arena.player().expect("player");
        assert_eq!(player.fsm.kind(), StateKind::Airborne);
        assert!(player.body.melee.is_ready(arena.now()));
        assert!(!player.body.air_kick.is_ready(arena.now()));
    }

    #[test]
    fn e2e_boss_phase_follows_thresholds() {
        let mut arena = Arena::new(ArenaConfig::default()).expect("arena");
        let boss = arena
            .spawn_archetype("warden", Vec3::new(0.0, 0.0, 4.0))
            .expect("boss");

        // 310 raw against 10 defense leaves 200 of 500
        let outcome = arena.apply_hit(boss, 310.0).expect("hit");
        assert_eq!(outcome.applied, 300.0);
        assert_eq!(arena.agent(boss).and_then(|a| a.phase()), Some(2));

        let events = arena.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::BossPhaseChanged { phase: 2, .. }
        )));
    }

    #[test]
    fn e2e_dead_agent_removed_after_grace() {
        let mut arena = Arena::new(ArenaConfig::default()).expect("arena");
        let grunt = arena.spawn_archetype("grunt", Vec3::ZERO).expect("grunt");
        arena.apply_hit(grunt, 10_000.0);

        for _ in 0..10 {
            arena.tick(0.5);
        }
        assert!(arena.agent(grunt).is_none());
        assert!(arena
            .drain_events()
            .contains(&GameEvent::AgentRemoved { agent: grunt }));
    }
}

/// Reproducibility
mod determinism_tests {
    use super::*;

    fn record(seed: u64) -> Vec<GameEvent> {
        let config = ArenaConfig {
            seed,
            ..ArenaConfig::default()
        };
        let mut arena = Arena::new(config).expect("arena");
        arena.start();
        let mut events = Vec::new();
        for i in 0..600 {
            let frame = if i % 20 == 0 {
                InputFrame::attacking()
            } else {
                InputFrame::moving(0.3, 0.0)
            };
            arena.set_input(frame);
            arena.tick(1.0 / 30.0);
            events.extend(arena.drain_events());
        }
        events
    }

    #[test]
    fn e2e_same_seed_same_events() {
        assert_eq!(record(7), record(7));
    }
}
