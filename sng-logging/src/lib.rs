//! sng-logging: append-only NDJSON events for run post-mortems.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One finished search problem.
#[derive(Debug, Clone, Serialize)]
pub struct SearchEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub run_id: String,

    pub problem_index: i32,
    pub solved: bool,
    pub aborted: bool,
    pub elapsed_ms: u64,
}

/// End-of-run roll-up.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummaryV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub run_id: String,

    pub problems: u64,
    pub solved: u64,
    pub aborted: u64,
    pub threads: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug)]
pub enum LogError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl From<io::Error> for LogError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for LogError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::Io(e) => write!(f, "log io error: {e}"),
            LogError::Json(e) => write!(f, "log encode error: {e}"),
        }
    }
}

impl std::error::Error for LogError {}

/// Append-only NDJSON writer.
///
/// Contract: each call writes exactly one JSON object followed by a
/// newline.
pub struct NdjsonWriter {
    w: BufWriter<File>,
    lines_since_flush: u64,
    flush_every_lines: u64,
}

impl NdjsonWriter {
    /// Open a file for append. Creates it if it doesn't exist.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, LogError> {
        Self::open_append_with_flush(path, 0)
    }

    /// `flush_every_lines=0` disables periodic flushing.
    pub fn open_append_with_flush(
        path: impl AsRef<Path>,
        flush_every_lines: u64,
    ) -> Result<Self, LogError> {
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            w: BufWriter::new(f),
            lines_since_flush: 0,
            flush_every_lines,
        })
    }

    pub fn write_event<T: Serialize>(&mut self, event: &T) -> Result<(), LogError> {
        let mut buf = serde_json::to_vec(event)?;
        buf.push(b'\n');
        self.w.write_all(&buf)?;
        self.lines_since_flush += 1;
        if self.flush_every_lines > 0 && self.lines_since_flush >= self.flush_every_lines {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), LogError> {
        self.w.flush()?;
        self.lines_since_flush = 0;
        Ok(())
    }
}

/// Milliseconds since the epoch, for event timestamps.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
