//! # Plotter Configuration
//!
//! Kinematic limits for the planner, curve throttler tuning and stepper
//! scaling, loaded from a single TOML file. Every field has a default, so a
//! partial (or empty) file is valid.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [planner]
//! max_velocity = 4.0
//! acceleration = 16.0
//! corner_factor = 0.001
//!
//! [throttle]
//! time_step = 0.02
//! threshold = 0.001
//!
//! [stepper]
//! steps_per_unit = 2032.0
//! timeslice_ms = 10
//! ```

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::motion::PlannerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerSection,
    #[serde(default)]
    pub throttle: ThrottleSection,
    #[serde(default)]
    pub stepper: StepperSection,
}

/// Velocity and acceleration limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlannerSection {
    #[serde(default = "default_max_velocity")]
    pub max_velocity: f64,
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
    #[serde(default = "default_corner_factor")]
    pub corner_factor: f64,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            max_velocity: default_max_velocity(),
            acceleration: default_acceleration(),
            corner_factor: default_corner_factor(),
        }
    }
}

/// Curve-following speed limiter tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThrottleSection {
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for ThrottleSection {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            threshold: default_threshold(),
        }
    }
}

/// Conversion from plotter units to motor steps.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StepperSection {
    #[serde(default = "default_steps_per_unit")]
    pub steps_per_unit: f64,
    #[serde(default = "default_timeslice_ms")]
    pub timeslice_ms: u32,
}

impl Default for StepperSection {
    fn default() -> Self {
        Self {
            steps_per_unit: default_steps_per_unit(),
            timeslice_ms: default_timeslice_ms(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        PlannerConfig::new_from_config(self)
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !(self.stepper.steps_per_unit.is_finite() && self.stepper.steps_per_unit > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "steps_per_unit must be > 0, got {}",
                self.stepper.steps_per_unit
            )));
        }
        if self.stepper.timeslice_ms == 0 {
            return Err(ConfigError::Invalid("timeslice_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

// Default value functions
fn default_max_velocity() -> f64 { 4.0 }
fn default_acceleration() -> f64 { 16.0 }
fn default_corner_factor() -> f64 { 0.001 }
fn default_time_step() -> f64 { 0.02 }
fn default_threshold() -> f64 { 0.001 }
fn default_steps_per_unit() -> f64 { 2032.0 }
fn default_timeslice_ms() -> u32 { 10 }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}
