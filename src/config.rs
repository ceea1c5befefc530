use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file")]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Build parameters for both pipeline stages.
///
/// Keys match the documented parameter dictionary, so a JSON override file
/// can spell any subset of them; everything else keeps its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Config {
    /// Max walk-leg distance in meters.
    pub walking_radius: f64,
    /// Walking speed in m/s.
    pub walking_speed: f64,
    /// Max combined walk + wait budget in seconds.
    pub max_walk_wait_time: i64,
    /// Max transfer window in seconds.
    pub max_transfer_time: i64,
    /// Min transfer delay in seconds.
    pub min_transfer_time: i64,
    /// Dwell at each stop in seconds, unless overridden per bus type.
    pub default_waiting_time: i64,
    /// Per-bus-type dwell overrides, keyed by the route's `Type` string.
    pub waiting_time_by_type: HashMap<String, i64>,
    /// Minimum accepted trip speed in m/s.
    pub min_avg_speed: f64,
    /// Optional cap on the number of routes ingested.
    pub route_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            walking_radius: 400.0,
            walking_speed: 1.2,
            max_walk_wait_time: 3600,
            max_transfer_time: 1800,
            min_transfer_time: 120,
            default_waiting_time: 30,
            waiting_time_by_type: HashMap::new(),
            min_avg_speed: 1.0,
            route_limit: None,
        }
    }
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// Reject parameter combinations no builder can run under. Fatal at
    /// startup, unlike the per-trip validation failures which only skip.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_transfer_time < self.min_transfer_time {
            return Err(ConfigError::Invalid(format!(
                "MAX_TRANSFER_TIME ({}) < MIN_TRANSFER_TIME ({})",
                self.max_transfer_time, self.min_transfer_time
            )));
        }
        if self.walking_radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "WALKING_RADIUS must be positive, got {}",
                self.walking_radius
            )));
        }
        if self.walking_speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "WALKING_SPEED must be positive, got {}",
                self.walking_speed
            )));
        }
        Ok(())
    }

    /// Dwell time for a bus type, falling back to the default when the type
    /// has no override.
    pub fn dwell_for(&self, bus_type: &str) -> i64 {
        self.waiting_time_by_type
            .get(bus_type)
            .copied()
            .unwrap_or(self.default_waiting_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.walking_radius, 400.0);
        assert_eq!(config.min_transfer_time, 120);
        assert_eq!(config.dwell_for("unknown type"), 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dwell_override() {
        let mut config = Config::default();
        config.waiting_time_by_type.insert("BRT".to_string(), 45);
        assert_eq!(config.dwell_for("BRT"), 45);
        assert_eq!(config.dwell_for("Standard"), 30);
    }

    #[test]
    fn test_validate_transfer_window() {
        let config = Config {
            max_transfer_time: 60,
            min_transfer_time: 120,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_walking_params() {
        let config = Config {
            walking_radius: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            walking_speed: -1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_override_from_json() {
        let json = r#"{"WALKING_RADIUS": 500.0, "WAITING_TIME_BY_TYPE": {"BRT": 20}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.walking_radius, 500.0);
        assert_eq!(config.dwell_for("BRT"), 20);
        // untouched keys keep their defaults
        assert_eq!(config.walking_speed, 1.2);
        assert_eq!(config.max_walk_wait_time, 3600);
    }
}
