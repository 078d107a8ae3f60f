//! Configuration management (config.toml)
//!
//! One TOML file with a section per concern. Missing sections and fields fall
//! back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use afterglow_core::config::{self as core_config, ConfigError};
use afterglow_core::{BroadcastConfig, SyncConfig};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Tempo, song length and track sources
    #[serde(default)]
    pub sync: SyncConfig,
    /// Stage light output
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    /// Scene track value for each scene
    #[serde(default)]
    pub scenes: SceneIndices,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Scene track values that select each scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneIndices {
    #[serde(default = "default_mountains")]
    pub mountains: i32,
    #[serde(default = "default_bunny")]
    pub bunny: i32,
    #[serde(default = "default_warp")]
    pub warp: i32,
    #[serde(default = "default_sea")]
    pub sea: i32,
    #[serde(default = "default_crystals")]
    pub crystals: i32,
}

/// Frame loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Target frames per second (default: 120)
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
}

fn default_mountains() -> i32 {
    0
}
fn default_bunny() -> i32 {
    1
}
fn default_warp() -> i32 {
    2
}
fn default_sea() -> i32 {
    3
}
fn default_crystals() -> i32 {
    4
}
fn default_tick_rate() -> u32 {
    120
}

impl Default for SceneIndices {
    fn default() -> Self {
        Self {
            mountains: default_mountains(),
            bunny: default_bunny(),
            warp: default_warp(),
            sea: default_sea(),
            crystals: default_crystals(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
        }
    }
}

impl RuntimeConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_rate.max(1)))
    }
}

/// Path of the default config file, if a home directory exists.
pub fn config_path() -> Option<PathBuf> {
    core_config::config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Loads the configuration from the platform config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match core_config::load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{}, using defaults", e);
            Config::default()
        }
    }
}

/// Loads an explicitly named config file. Errors are returned, not defaulted.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    core_config::load_from(path)
}

/// Saves the configuration to the platform config directory.
///
/// Returns the path written, or `None` without a home directory.
pub fn save(config: &Config) -> anyhow::Result<Option<PathBuf>> {
    let Some(path) = config_path() else {
        return Ok(None);
    };
    save_to(config, &path)?;
    Ok(Some(path))
}

pub fn save_to(config: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
