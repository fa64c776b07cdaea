//! Framepulse telemetry engine library
//!
//! This library provides the in-process performance telemetry and alerting
//! engine for the Framepulse launcher: metric sampling through pluggable
//! producers, threshold evaluation, health scoring, and bounded history
//! with JSON report export.

pub mod alert;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod producers;
pub mod sampler;
pub mod score;
pub mod snapshot;
pub mod thresholds;

// Re-export commonly used types
pub use alert::Alert;
pub use config::{EngineConfig, HistoryConfig, LoggingConfig, SamplerConfig};
pub use engine::TelemetryEngine;
pub use error::{ConfigError, ProducerError, Result, TelemetryError};
pub use history::{HistoryStore, Report, ReportSummary};
pub use producers::{default_producers, DiskProducer, NetworkProducer, SystemProducer};
pub use sampler::{MetricSampler, Producer};
pub use score::score;
pub use snapshot::{BuildInfo, MetricCategory, Snapshot};
pub use thresholds::{Direction, Severity, ThresholdSpec, ThresholdTable};
