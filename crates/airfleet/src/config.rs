//! Configuration management for airfleet.
//!
//! Configuration is layered with figment: built-in defaults, then a TOML
//! file, then `AIRFLEET_` environment variables. Nested keys use a double
//! underscore in the environment, e.g. `AIRFLEET_STORAGE__BUSY_TIMEOUT_MS`.

use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "airfleet";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "fleet.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "AIRFLEET_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AIRFLEET_`)
/// 2. TOML config file at `~/.config/airfleet/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Reporting configuration.
    pub report: ReportConfig,
    /// Sample data configuration.
    pub seed: SeedConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/airfleet/fleet.db`
    pub database_path: Option<PathBuf>,
    /// How long a writer waits for another connection's lock.
    pub busy_timeout_ms: u64,
}

/// Reporting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Window length used when a report is requested without an end time.
    pub default_window_days: u32,
}

/// Sample data generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Number of aircraft to create.
    pub aircraft_count: usize,
    /// Number of flights to create.
    pub flight_count: usize,
    /// Probability that a generated flight gets an aircraft.
    pub assigned_ratio: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: 5_000,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_window_days: 30,
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            aircraft_count: 15,
            flight_count: 50,
            assigned_ratio: 0.9,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and the environment still
    /// apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Self::figment(&config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &std::path::Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.busy_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "busy_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.report.default_window_days == 0 {
            return Err(Error::ConfigValidation {
                message: "default_window_days must be greater than 0".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.seed.assigned_ratio) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "assigned_ratio ({}) must be between 0 and 1",
                    self.seed.assigned_ratio
                ),
            });
        }

        if self
            .storage
            .database_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "database_path cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the busy timeout as a Duration.
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.busy_timeout_ms)
    }

    /// Get the default report window length.
    #[must_use]
    pub fn default_report_window(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.report.default_window_days))
    }
}
