//! # App Configuration
//!
//! Settings for the three controllers, loaded from a single TOML file. Every field has a
//! default, so an empty file (or a missing section) is valid.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [counter]
//! interval_secs = 5
//!
//! [temperature]
//! period_secs = 2
//! min_value = 65.0
//! max_value = 85.0
//! history_capacity = 20
//! autostart = true
//!
//! [lifetracker]
//! record_launch = true
//! ```

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub counter: CounterConfig,
    #[serde(default)]
    pub temperature: TemperatureConfig,
    #[serde(default)]
    pub lifetracker: LifeTrackerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CounterConfig {
    /// Auto-increment period.
    #[serde(default = "default_counter_interval")]
    pub interval_secs: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_counter_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TemperatureConfig {
    #[serde(default = "default_temperature_period")]
    pub period_secs: u64,
    /// Lower bound of simulated readings, °F.
    #[serde(default = "default_min_value")]
    pub min_value: f32,
    /// Exclusive upper bound of simulated readings, °F.
    #[serde(default = "default_max_value")]
    pub max_value: f32,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_true")]
    pub autostart: bool,
    /// Fixed RNG seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            period_secs: default_temperature_period(),
            min_value: default_min_value(),
            max_value: default_max_value(),
            history_capacity: default_history_capacity(),
            autostart: true,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LifeTrackerConfig {
    /// Log the raw launch entry before lifecycle observation begins.
    #[serde(default = "default_true")]
    pub record_launch: bool,
}

impl Default for LifeTrackerConfig {
    fn default() -> Self {
        Self { record_launch: true }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.counter.interval_secs == 0 {
            return Err(ConfigError::Invalid("counter.interval_secs must be > 0".to_string()));
        }
        let t = &self.temperature;
        if t.period_secs == 0 {
            return Err(ConfigError::Invalid("temperature.period_secs must be > 0".to_string()));
        }
        if !t.min_value.is_finite() || !t.max_value.is_finite() || t.min_value >= t.max_value {
            return Err(ConfigError::Invalid(format!(
                "temperature range [{}, {}) is empty",
                t.min_value, t.max_value
            )));
        }
        if t.history_capacity == 0 {
            return Err(ConfigError::Invalid("temperature.history_capacity must be > 0".to_string()));
        }
        Ok(())
    }
}

// Default value functions
fn default_counter_interval() -> u64 { 3 }
fn default_temperature_period() -> u64 { 2 }
fn default_min_value() -> f32 { 65.0 }
fn default_max_value() -> f32 { 85.0 }
fn default_history_capacity() -> usize { 20 }
fn default_true() -> bool { true }

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::debug!("Could not read config file '{}': {}", path.display(), e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}
