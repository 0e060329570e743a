//! Configuration module for the loopstat CLI.
//!
//! This module handles loading, saving, and locating the TOML configuration
//! file. The `[collector]` section is the runtime's own `CollectorConfig`;
//! `[demo]` sizes the simulated run.

use dirs::{config_dir, home_dir};
use loopstat_runtime::CollectorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "loopstat.toml";

/// Application configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Settings for every simulated host's collector.
    ///
    /// When loaded from a file, keys missing from `[collector]` (or the whole
    /// section) fall back to `CollectorConfig::from_env`.
    #[serde(default = "CollectorConfig::from_env")]
    pub collector: CollectorConfig,

    /// Demo-specific configuration.
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Shape of the simulated run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemoConfig {
    /// Number of simulated hosts, sink included.
    #[serde(default = "default_hosts")]
    pub hosts: u32,

    /// Distinct loop names per host.
    #[serde(default = "default_loops")]
    pub loops: usize,

    /// Instances of each loop.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

fn default_hosts() -> u32 {
    2
}

fn default_loops() -> usize {
    2
}

fn default_iterations() -> usize {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collector: CollectorConfig::from_env(),
            demo: DemoConfig::default(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            loops: default_loops(),
            iterations: default_iterations(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Searches for configuration in the following order:
    /// 1. Current directory
    /// 2. User's home directory
    /// 3. System configuration directory
    ///
    /// Returns the default configuration if no config file is found.
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content, CollectorConfig::from_env())?;
        config.collector.validate().map_err(|e| {
            CliError::Config(format!("{}: {}", path.display(), e))
        })?;

        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse TOML, filling keys missing from `[collector]` from `base`.
    pub fn from_toml_str(content: &str, base: CollectorConfig) -> Result<Self> {
        let mut table: toml::Table = toml::from_str(content)?;

        let mut collector = toml::Value::try_from(base)?;
        if let Some(section) = table.remove("collector") {
            overlay(&mut collector, section);
        }
        table.insert("collector".to_string(), collector);

        Ok(Config::deserialize(toml::Value::Table(table))?)
    }

    /// Save configuration to a specific path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check for config in current directory.
    fn check_current_dir_config() -> Option<PathBuf> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        path.exists().then_some(path)
    }

    /// Check for config in home directory.
    fn check_home_config() -> Option<PathBuf> {
        home_dir()
            .map(|dir| dir.join(".config").join("loopstat").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Check for config in system config directory.
    fn check_system_config() -> Option<PathBuf> {
        config_dir()
            .map(|dir| dir.join("loopstat").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Find the configuration file in standard locations.
    fn find_config_file() -> Option<PathBuf> {
        Self::check_current_dir_config()
            .or_else(Self::check_home_config)
            .or_else(Self::check_system_config)
    }
}

/// Merge `over` into `base`; tables merge key by key, anything else replaces.
fn overlay(base: &mut toml::Value, over: toml::Value) {
    match (base, over) {
        (toml::Value::Table(base), toml::Value::Table(over)) => {
            for (key, value) in over {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    },
                }
            }
        },
        (base, over) => *base = over,
    }
}
