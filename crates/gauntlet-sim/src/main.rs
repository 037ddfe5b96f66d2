//! # Gauntlet Sim
//!
//! Headless runner for Gauntlet levels.
//!
//! Loads an arena config, drives the arena at a fixed tick rate with an
//! autopilot player and optionally records every event as JSON lines.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod autopilot;
mod event_log;
mod options;

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gauntlet_gameplay::{Arena, ArenaConfig, ArenaSnapshot, RunStatus};

use crate::autopilot::Autopilot;
use crate::event_log::JsonLinesLog;
use crate::options::{Options, USAGE};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("gauntlet=info".parse()?))
        .init();

    let options = Options::parse(std::env::args().skip(1))?;
    if options.help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = load_config(&options);
    if options.dump_config {
        println!("{}", config.to_toml_string()?);
        return Ok(());
    }

    info!("Gauntlet sim {}", env!("CARGO_PKG_VERSION"));
    let snapshot = run(config, &options)?;
    info!("Finished: {}", serde_json::to_string(&snapshot)?);
    Ok(())
}

fn load_config(options: &Options) -> ArenaConfig {
    let mut config = options
        .config
        .as_ref()
        .map_or_else(ArenaConfig::default, ArenaConfig::load_from);
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    config
}

/// Runs one session until it ends or the time budget is spent.
fn run(config: ArenaConfig, options: &Options) -> Result<ArenaSnapshot> {
    let mut arena = Arena::new(config).context("invalid arena config")?;
    let pilot = Autopilot::for_arena(&arena);

    let mut log = match &options.events {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            Some(JsonLinesLog::new(BufWriter::new(file)))
        },
        None => None,
    };

    arena.start();
    flush_events(&arena, log.as_mut());

    let dt = options.dt();
    for _ in 0..options.total_ticks() {
        arena.set_input(pilot.frame(&arena));
        arena.tick(dt);
        flush_events(&arena, log.as_mut());

        if matches!(arena.status(), RunStatus::Victory | RunStatus::Defeat) {
            break;
        }
    }

    if let Some(log) = log {
        let written = log.written();
        log.finish()?;
        info!("Wrote {written} events");
    }
    Ok(arena.snapshot())
}

fn flush_events<W: Write>(arena: &Arena, log: Option<&mut JsonLinesLog<W>>) {
    match log {
        Some(log) => {
            log.set_clock(arena.tick_count(), arena.now());
            arena.events().dispatch(log);
        },
        None => {
            arena.drain_events();
        },
    }
}
