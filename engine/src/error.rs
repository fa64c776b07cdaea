//! Error handling for the Framepulse telemetry engine
//!
//! Steady-state operation (ticks, sampling, history reads) never surfaces
//! an error: producer outages are absorbed by the sampler. Errors exist at
//! the edges only: engine construction, configuration loading, and report
//! serialization.

use std::io;

use thiserror::Error;

/// The main error type for the telemetry engine
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Producer related errors
    #[error("Producer error: {0}")]
    Producer(#[from] ProducerError),

    /// Report serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic errors
    #[error("{0}")]
    Generic(String),
}

/// Configuration related errors
///
/// A malformed threshold table is fatal at engine construction: a missing
/// threshold silently disables alerting for that metric, which is worse
/// than failing fast.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration parsing error: {reason}")]
    ParseError { reason: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("Empty threshold table")]
    EmptyThresholdTable,

    #[error("Duplicate threshold for metric: {metric}")]
    DuplicateThreshold { metric: String },

    #[error("Non-finite threshold limit for metric: {metric}")]
    NonFiniteLimit { metric: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
}

/// Producer related errors
///
/// These never escape `sample()`; the sampler recovers with the category's
/// last-known readings and increments the partial-failure counter.
#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("Producer timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Producer collection failed: {reason}")]
    CollectionFailed { reason: String },

    #[error("Metric source unavailable: {source_name}")]
    SourceUnavailable { source_name: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// A specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// A specialized result type for producer operations
pub type ProducerResult<T> = std::result::Result<T, ProducerError>;

impl TelemetryError {
    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            TelemetryError::Config(_) => "config",
            TelemetryError::Producer(_) => "producer",
            TelemetryError::Serialization(_) => "serialization",
            TelemetryError::Io(_) => "io",
            TelemetryError::Generic(_) => "generic",
        }
    }

    /// Check if this error is recoverable by the pipeline
    pub fn is_recoverable(&self) -> bool {
        match self {
            TelemetryError::Config(_) => false,
            TelemetryError::Producer(_) => true,
            TelemetryError::Serialization(_) => true,
            TelemetryError::Io(io_error) => matches!(
                io_error.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
            ),
            TelemetryError::Generic(_) => true,
        }
    }
}

impl From<String> for TelemetryError {
    fn from(msg: String) -> Self {
        TelemetryError::Generic(msg)
    }
}

impl From<&str> for TelemetryError {
    fn from(msg: &str) -> Self {
        TelemetryError::Generic(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        let config_error = TelemetryError::Config(ConfigError::EmptyThresholdTable);
        assert_eq!(config_error.category(), "config");
        assert!(!config_error.is_recoverable());

        let producer_error = TelemetryError::Producer(ProducerError::Timeout { timeout_ms: 250 });
        assert_eq!(producer_error.category(), "producer");
        assert!(producer_error.is_recoverable());
    }

    #[test]
    fn test_error_conversion() {
        let err = TelemetryError::from("tick failed");
        assert!(matches!(err, TelemetryError::Generic(_)));
        assert_eq!(err.category(), "generic");
    }
}
