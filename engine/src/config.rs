//! Configuration for the telemetry engine
//!
//! Configuration is loaded once, validated eagerly, and injected into the
//! engine at construction; there is no global state and no reload path.
//! The threshold table lives here because it is configuration, not derived
//! state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::thresholds::ThresholdTable;

/// Main configuration for one engine instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// History retention configuration
    pub history: HistoryConfig,

    /// Sampler configuration
    pub sampler: SamplerConfig,

    /// Logging configuration (consumed by the embedding application)
    pub logging: LoggingConfig,

    /// Threshold table
    pub thresholds: ThresholdTable,
}

/// History retention configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Snapshot ring capacity
    pub snapshot_capacity: usize,

    /// Alert ring capacity
    pub alert_capacity: usize,
}

/// Sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Per-producer timeout in milliseconds
    pub producer_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Emit JSON-formatted logs
    pub json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            sampler: SamplerConfig::default(),
            logging: LoggingConfig::default(),
            thresholds: ThresholdTable::default_table(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            snapshot_capacity: 100,
            alert_capacity: 50,
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            producer_timeout_ms: 250,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        })?;

        let config: EngineConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback: file if present, defaults otherwise
    pub fn load_with_fallback<P: AsRef<Path>>(config_path: Option<P>) -> ConfigResult<Self> {
        let config = match config_path {
            Some(path) if path.as_ref().exists() => EngineConfig::from_file(path)?,
            _ => EngineConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// A malformed threshold table is fatal here rather than silently
    /// disabling alerting for a metric later.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.history.snapshot_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.snapshot_capacity".to_string(),
                value: "0".to_string(),
            });
        }

        if self.history.alert_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.alert_capacity".to_string(),
                value: "0".to_string(),
            });
        }

        if self.sampler.producer_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sampler.producer_timeout_ms".to_string(),
                value: "0".to_string(),
            });
        }

        self.thresholds.validate()?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("framepulse").join("engine.toml"))
            .ok_or_else(|| ConfigError::ValidationFailed {
                reason: "Unable to determine config directory".to_string(),
            })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::ValidationFailed {
                reason: format!("Unable to create config directory: {}", parent.display()),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationFailed {
            reason: e.to_string(),
        })?;

        fs::write(path, content).map_err(|_| ConfigError::ValidationFailed {
            reason: format!("Unable to write config file: {}", path.display()),
        })?;

        Ok(())
    }
}
