use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::coordinator::CoordinatorOptions;
use crate::error::ConfigError;
use crate::models::MediaTime;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Cadence of the periodic now-playing refresh.
    pub tick_interval_secs: f64,
    pub tick_timescale: i32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1.0,
            tick_timescale: 30_000,
        }
    }
}

impl CoordinatorConfig {
    pub fn tick_interval(&self) -> Result<MediaTime, ConfigError> {
        let interval = MediaTime::with_seconds(self.tick_interval_secs, self.tick_timescale);
        if !interval.is_numeric() || interval.value() <= 0 {
            return Err(ConfigError::InvalidTickInterval(format!(
                "{}s at timescale {}",
                self.tick_interval_secs, self.tick_timescale
            )));
        }
        Ok(interval)
    }

    pub fn options(&self) -> Result<CoordinatorOptions, ConfigError> {
        Ok(CoordinatorOptions {
            tick_interval: self.tick_interval()?,
            ..CoordinatorOptions::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Name shown by the system media controls; also the MPRIS bus suffix.
    pub identity: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            identity: "nowplay".to_string(),
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nowplay")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        config.coordinator.tick_interval()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        let tick = config.coordinator.tick_interval().unwrap();
        assert_eq!(tick.value(), 30_000);
        assert_eq!(tick.timescale(), 30_000);
        assert_eq!(tick.seconds(), 1.0);
        assert_eq!(config.surface.identity, "nowplay");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[coordinator]\ntick_interval_secs = 0.5\n").unwrap();
        assert_eq!(config.coordinator.tick_interval_secs, 0.5);
        assert_eq!(config.coordinator.tick_timescale, 30_000);
        assert_eq!(config.surface, SurfaceConfig::default());
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        let config = CoordinatorConfig {
            tick_interval_secs: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.tick_interval(),
            Err(ConfigError::InvalidTickInterval(_))
        ));

        let config = CoordinatorConfig {
            tick_timescale: 0,
            ..Default::default()
        };
        assert!(config.tick_interval().is_err());
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
