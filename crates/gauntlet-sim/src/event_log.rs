//! JSON-lines event sink.

use std::io::Write;

use serde::Serialize;
use tracing::warn;

use gauntlet_gameplay::{EventHandler, GameEvent};

/// One line of the log.
#[derive(Serialize)]
struct Record<'a> {
    tick: u64,
    time: f64,
    event: &'a GameEvent,
}

/// Writes each event as one JSON object per line.
pub struct JsonLinesLog<W: Write> {
    writer: W,
    tick: u64,
    time: f64,
    written: u64,
    failed: bool,
}

impl<W: Write> JsonLinesLog<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            tick: 0,
            time: 0.0,
            written: 0,
            failed: false,
        }
    }

    /// Stamps subsequent records.
    pub fn set_clock(&mut self, tick: u64, time: f64) {
        self.tick = tick;
        self.time = time;
    }

    /// Records written.
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Flushes and returns the writer.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> EventHandler for JsonLinesLog<W> {
    fn handle(&mut self, event: &GameEvent) {
        if self.failed {
            return;
        }
        let record = Record {
            tick: self.tick,
            time: self.time,
            event,
        };
        let result = serde_json::to_writer(&mut self.writer, &record)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        match result {
            Ok(()) => self.written += 1,
            Err(e) => {
                // Stop after the first failure.
                warn!("Event log disabled: {e}");
                self.failed = true;
            },
        }
    }
}
