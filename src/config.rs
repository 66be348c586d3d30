//! World configuration loaded from TOML

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{physics, time};
use crate::error::{EngineError, EngineResult};

/// Runtime configuration for a [`World`](crate::World).
///
/// Every field has a default, so a TOML file only needs to list the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u64,
    pub ticks_per_second: u32,
    pub unload_seconds: f32,
    pub worker_threads: usize,
    pub initial_reload_delay_ms: u64,
    pub reload_delay_ms: u64,
    pub gravity: f32,
    pub save_dir: Option<PathBuf>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            ticks_per_second: time::DEFAULT_TICKS_PER_SECOND,
            unload_seconds: time::CHUNK_UNLOAD_SECONDS,
            worker_threads: num_cpus::get().saturating_sub(2).max(2),
            initial_reload_delay_ms: physics::INITIAL_UNSURE_FIXTURE_RELOAD_DELAY_MS,
            reload_delay_ms: physics::UNSURE_FIXTURE_RELOAD_DELAY_MS,
            gravity: physics::DEFAULT_GRAVITY,
            save_dir: None,
        }
    }
}

impl WorldConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> EngineResult<Self> {
        let config: WorldConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        log::info!("[WorldConfig::load] Loading world configuration from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.ticks_per_second == 0 {
            return Err(EngineError::config("ticks_per_second must be greater than 0"));
        }
        if !(self.unload_seconds > 0.0) {
            return Err(EngineError::config("unload_seconds must be positive"));
        }
        if self.worker_threads == 0 {
            return Err(EngineError::config("worker_threads must be greater than 0"));
        }
        if self.initial_reload_delay_ms == 0 || self.reload_delay_ms == 0 {
            return Err(EngineError::config("reload delays must be greater than 0"));
        }
        Ok(())
    }

    /// Number of ticks a chunk may go unrequested before eviction
    pub fn unload_ticks(&self) -> u64 {
        (self.unload_seconds * self.ticks_per_second as f32).round() as u64
    }
}
