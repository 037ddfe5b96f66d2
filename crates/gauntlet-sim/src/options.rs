//! Command-line options.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Usage text.
pub const USAGE: &str = "\
Usage: gauntlet-sim [OPTIONS]

Options:
  --config <PATH>    Arena config (TOML); defaults are used if missing
  --seconds <N>      Simulated seconds to run [default: 180]
  --tick-rate <HZ>   Fixed ticks per second [default: 60]
  --seed <N>         Override the config seed
  --events <PATH>    Write every event as JSON lines
  --dump-config      Print the effective config as TOML and exit
  -h, --help         Print this help";

/// Parsed options.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Config file
    pub config: Option<PathBuf>,
    /// Simulated seconds
    pub seconds: f32,
    /// Ticks per second
    pub tick_rate: u32,
    /// Seed override
    pub seed: Option<u64>,
    /// Event log path
    pub events: Option<PathBuf>,
    /// Print config and exit
    pub dump_config: bool,
    /// Print usage and exit
    pub help: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config: None,
            seconds: 180.0,
            tick_rate: 60,
            seed: None,
            events: None,
            dump_config: false,
            help: false,
        }
    }
}

impl Options {
    /// Parses arguments, not including the program name.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            let mut value = |name: &str| {
                args.next()
                    .with_context(|| format!("{name} needs a value"))
            };
            match arg.as_str() {
                "--config" => options.config = Some(PathBuf::from(value("--config")?)),
                "--events" => options.events = Some(PathBuf::from(value("--events")?)),
                "--seconds" => {
                    let raw = value("--seconds")?;
                    options.seconds = raw
                        .parse()
                        .with_context(|| format!("invalid --seconds '{raw}'"))?;
                },
                "--tick-rate" => {
                    let raw = value("--tick-rate")?;
                    options.tick_rate = raw
                        .parse()
                        .with_context(|| format!("invalid --tick-rate '{raw}'"))?;
                },
                "--seed" => {
                    let raw = value("--seed")?;
                    options.seed = Some(parse_seed(&raw)?);
                },
                "--dump-config" => options.dump_config = true,
                "-h" | "--help" => options.help = true,
                other => bail!("unknown argument '{other}'\n\n{USAGE}"),
            }
        }

        if !(options.seconds.is_finite() && options.seconds > 0.0) {
            bail!("--seconds must be positive");
        }
        if options.tick_rate == 0 {
            bail!("--tick-rate must be at least 1");
        }
        Ok(options)
    }

    /// Seconds per tick.
    #[must_use]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Ticks needed to cover the requested time.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        (f64::from(self.seconds) * f64::from(self.tick_rate)).ceil() as u64
    }
}

/// Accepts decimal or `0x` hex.
fn parse_seed(raw: &str) -> Result<u64> {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.with_context(|| format!("invalid --seed '{raw}'"))
}
