//! Run configuration for the `sng` binary. The YAML file mirrors the
//! command-line flags; flags win when both are given.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Search worker threads.
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Seed forwarded to every game instance.
    #[serde(default)]
    pub seed: i64,
    /// Whether loose elements fall.
    #[serde(default = "default_gravity")]
    pub gravity: bool,
    /// How many times to cycle the board set.
    #[serde(default = "default_repeat")]
    pub repeat: usize,
    /// File with one board string per line.
    #[serde(default)]
    pub boards_file: Option<String>,
    /// NDJSON event log path.
    #[serde(default)]
    pub log_file: Option<String>,
}

fn default_threads() -> usize {
    8
}

fn default_gravity() -> bool {
    true
}

fn default_repeat() -> usize {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            seed: 0,
            gravity: default_gravity(),
            repeat: default_repeat(),
            boards_file: None,
            log_file: None,
        }
    }
}

impl RunConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}
