//! World and tick-loop configuration.

use std::path::Path;
use std::time::Duration;

use ecs_component::MAX_ENTITIES;
use serde::{Deserialize, Serialize};

use crate::error::EcsError;

/// Configuration for a [`Coordinator`](crate::Coordinator).
///
/// Every field is optional in the JSON form; missing fields take their
/// defaults.
///
/// ```json
/// { "max_entities": 1024, "tick_rate": 30.0, "max_ticks": 300 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Maximum number of simultaneously live entities, at most
    /// [`MAX_ENTITIES`].
    pub max_entities: u32,
    /// Target ticks per second for [`Coordinator::run`](crate::Coordinator::run).
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: MAX_ENTITIES,
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

impl WorldConfig {
    /// Set the entity limit.
    #[must_use]
    pub fn with_max_entities(mut self, max_entities: u32) -> Self {
        self.max_entities = max_entities;
        self
    }

    /// Set the target tick rate.
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Set the tick limit (0 = unlimited).
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ConfigParse`] on malformed JSON or unknown fields,
    /// and [`EcsError::Config`] if a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, EcsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Io`] if the file cannot be read, otherwise as
    /// [`WorldConfig::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EcsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), EcsError> {
        if self.max_entities == 0 || self.max_entities > MAX_ENTITIES {
            return Err(EcsError::Config(format!(
                "max_entities must be in 1..={MAX_ENTITIES}, got {}",
                self.max_entities
            )));
        }
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(EcsError::Config(format!(
                "tick_rate must be a positive number, got {}",
                self.tick_rate
            )));
        }
        self.tick_period()?;
        Ok(())
    }

    /// Wall-clock length of one tick at `tick_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Config`] if the period does not fit in a
    /// [`Duration`], which happens for vanishingly small rates.
    pub fn tick_period(&self) -> Result<Duration, EcsError> {
        Duration::try_from_secs_f64(1.0 / self.tick_rate).map_err(|err| {
            EcsError::Config(format!(
                "tick_rate {} gives an unrepresentable tick period: {err}",
                self.tick_rate
            ))
        })
    }
}
