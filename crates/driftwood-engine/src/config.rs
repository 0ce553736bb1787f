//! Engine configuration.
//!
//! Configuration is a JSON document with three optional sections. Missing
//! sections and keys take their defaults:
//!
//! ```json
//! {
//!   "tick":     { "tps": 60 },
//!   "movement": { "max_layermod_chain": 8 },
//!   "log":      { "verbose": false }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Host tick rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Ticks per second. Must be positive.
    pub tps: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self { tps: 60 }
    }
}

impl TickConfig {
    /// Milliseconds in one tick at this rate, never less than 1.
    pub fn frame_ms(&self) -> u64 {
        (1000 / self.tps.max(1) as u64).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Layer shifts a single tile arrival may chain through.
    pub max_layermod_chain: usize,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_layermod_chain: 8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log at `debug` instead of `info` when `RUST_LOG` is unset.
    pub verbose: bool,
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick: TickConfig,
    pub movement: MovementConfig,
    pub log: LogConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick.tps == 0 {
            return Err(ConfigError::Invalid("tick.tps must be positive".to_owned()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
