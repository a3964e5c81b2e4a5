//! Matrix observers for logging.
//!
//! [`EventLog`] writes one JSON object per event (JSONL). [`ConsoleReporter`]
//! prints the few events a player cares about to stderr.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::adapter::EventRecord;
use crate::core::{Matrix, MatrixObserver};
use crate::types::MatrixEvent;

#[derive(Debug, Serialize)]
struct LogLine<'a> {
    /// Session time in ms
    t: u64,
    state: &'a str,
    score: u32,
    event: EventRecord,
}

/// JSONL event log
pub struct EventLog<W: Write> {
    writer: BufWriter<W>,
    failed: bool,
}

impl EventLog<File> {
    /// Append to `path`, creating it if needed
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> EventLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            failed: false,
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    fn write_line(&mut self, event: &MatrixEvent, matrix: &Matrix) -> anyhow::Result<()> {
        let line = LogLine {
            t: matrix.elapsed_ms() as u64,
            state: matrix.state().as_str(),
            score: matrix.score(),
            event: EventRecord::from(event),
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        // Lines are small; flush at piece boundaries only.
        if matches!(event, MatrixEvent::Locked(_) | MatrixEvent::ToppedOut) {
            self.writer.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> MatrixObserver for EventLog<W> {
    fn on_event(&mut self, event: &MatrixEvent, matrix: &Matrix) {
        if self.failed {
            return;
        }
        if let Err(e) = self.write_line(event, matrix) {
            eprintln!("[Kinetris] Event log disabled: {}", e);
            self.failed = true;
        }
    }
}

/// Prints level ups, line clears and game over
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn describe(event: &MatrixEvent, matrix: &Matrix) -> Option<String> {
        match event {
            MatrixEvent::LinesCleared(rows) => Some(format!(
                "{} line(s) cleared, {} total",
                rows.count(),
                matrix.lines()
            )),
            MatrixEvent::LevelChanged(_) => Some(format!("level {}", matrix.level())),
            MatrixEvent::ToppedOut => Some(format!(
                "game over: score {}, lines {}, level {}",
                matrix.score(),
                matrix.lines(),
                matrix.level()
            )),
            _ => None,
        }
    }
}

impl MatrixObserver for ConsoleReporter {
    fn on_event(&mut self, event: &MatrixEvent, matrix: &Matrix) {
        if let Some(line) = Self::describe(event, matrix) {
            // raw mode: no implicit carriage return
            eprint!("[Kinetris] {}\r\n", line);
        }
    }
}
