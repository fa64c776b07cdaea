//! Threshold table and evaluator
//!
//! The threshold table is configuration, not derived state: it is loaded
//! once at engine construction and validated there, since a missing or
//! malformed entry would silently disable alerting for that metric.
//!
//! Evaluation walks the table in declaration order, so repeated evaluation
//! of an identical snapshot yields identical alert ordering. Breach is a
//! strict inequality in both directions; a value exactly at the limit is
//! never a breach.

use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::error::{ConfigError, ConfigResult};
use crate::snapshot::{MetricCategory, Snapshot, ERROR_COUNT_METRIC, RENDER_TIME_METRIC};

/// Which side of the limit is unhealthy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Breach when `value > limit` (temperatures, usage, latencies)
    AboveIsBad,
    /// Breach when `value < limit` (FPS, throughput, health, hit rates)
    BelowIsBad,
}

/// Alert severity, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// One static table entry per tracked metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSpec {
    /// Metric name as reported by the category's producer
    pub metric: String,

    /// Category the metric belongs to
    pub category: MetricCategory,

    /// Breach limit
    pub limit: f64,

    /// Comparison direction
    pub direction: Direction,

    /// Severity assigned to alerts for this metric
    pub severity: Severity,

    /// Health-score penalty subtracted while this threshold is violated
    pub penalty: u32,
}

impl ThresholdSpec {
    /// Whether `value` breaches this threshold (strict inequality)
    pub fn is_breached(&self, value: f64) -> bool {
        match self.direction {
            Direction::AboveIsBad => value > self.limit,
            Direction::BelowIsBad => value < self.limit,
        }
    }
}

/// The ordered threshold table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable {
    specs: Vec<ThresholdSpec>,
}

impl ThresholdTable {
    pub fn new(specs: Vec<ThresholdSpec>) -> ConfigResult<Self> {
        let table = Self { specs };
        table.validate()?;
        Ok(table)
    }

    /// Validate the table; fatal at engine construction if it fails
    pub fn validate(&self) -> ConfigResult<()> {
        if self.specs.is_empty() {
            return Err(ConfigError::EmptyThresholdTable);
        }

        let mut seen = std::collections::HashSet::new();
        for spec in &self.specs {
            if spec.metric.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "thresholds.metric".to_string(),
                    value: "(empty)".to_string(),
                });
            }
            if !spec.limit.is_finite() {
                return Err(ConfigError::NonFiniteLimit {
                    metric: spec.metric.clone(),
                });
            }
            if spec.penalty == 0 || spec.penalty > 100 {
                return Err(ConfigError::InvalidValue {
                    field: format!("thresholds.{}.penalty", spec.metric),
                    value: spec.penalty.to_string(),
                });
            }
            if !seen.insert((spec.category, spec.metric.clone())) {
                return Err(ConfigError::DuplicateThreshold {
                    metric: spec.metric.clone(),
                });
            }
        }

        Ok(())
    }

    /// Entries in declaration order
    pub fn specs(&self) -> &[ThresholdSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Evaluate a snapshot against every entry in the table
    ///
    /// A metric absent from the snapshot (producer failure) is skipped,
    /// never treated as a breach. Multiple simultaneous breaches each
    /// produce an independent alert in table order.
    pub fn evaluate(&self, snapshot: &Snapshot) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for spec in &self.specs {
            let Some(value) = snapshot.value(spec.category, &spec.metric) else {
                continue;
            };

            if spec.is_breached(value) {
                alerts.push(Alert::from_breach(spec, value, &snapshot.label));
            }
        }

        alerts
    }

    /// Default table for the launcher's desktop gaming workload
    ///
    /// Limits and penalties match the shipped tuning: zero tolerance on
    /// errors, 60 FPS floor, 200ms render budget.
    pub fn default_table() -> Self {
        use Direction::{AboveIsBad, BelowIsBad};
        use MetricCategory::*;
        use Severity::{Critical, High};

        let spec = |metric: &str, category, limit, direction, severity, penalty| ThresholdSpec {
            metric: metric.to_string(),
            category,
            limit,
            direction,
            severity,
            penalty,
        };

        Self {
            specs: vec![
                // Core performance
                spec(RENDER_TIME_METRIC, CorePerformance, 200.0, AboveIsBad, High, 10),
                spec("fps", CorePerformance, 60.0, BelowIsBad, High, 15),
                spec("memory_usage", CorePerformance, 1024.0 * 1024.0 * 1024.0, AboveIsBad, High, 10),
                spec("network_latency", CorePerformance, 100.0, AboveIsBad, High, 5),
                spec("cache_hit_rate", CorePerformance, 0.8, BelowIsBad, High, 5),
                spec(ERROR_COUNT_METRIC, CorePerformance, 0.0, AboveIsBad, Critical, 20),
                spec("api_response_time", CorePerformance, 500.0, AboveIsBad, High, 5),
                spec("ui_interaction_latency", CorePerformance, 50.0, AboveIsBad, High, 5),
                // GPU
                spec("gpu_usage", Gpu, 95.0, AboveIsBad, High, 10),
                spec("gpu_temperature", Gpu, 85.0, AboveIsBad, Critical, 15),
                spec("vram_usage_ratio", Gpu, 0.9, AboveIsBad, High, 10),
                spec("gpu_power_ratio", Gpu, 0.95, AboveIsBad, High, 5),
                spec("gpu_fan_speed", Gpu, 90.0, AboveIsBad, High, 5),
                // Disk
                spec("disk_read_speed", Disk, 100.0, BelowIsBad, High, 5),
                spec("disk_write_speed", Disk, 50.0, BelowIsBad, High, 5),
                spec("disk_usage_ratio", Disk, 0.9, AboveIsBad, Critical, 10),
                spec("disk_latency", Disk, 10.0, AboveIsBad, High, 5),
                spec("disk_iops", Disk, 1000.0, BelowIsBad, High, 5),
                spec("disk_temperature", Disk, 60.0, AboveIsBad, Critical, 5),
                spec("disk_health", Disk, 80.0, BelowIsBad, High, 15),
                // System
                spec("cpu_usage", System, 85.0, AboveIsBad, High, 10),
                spec("cpu_temperature", System, 80.0, AboveIsBad, Critical, 15),
                spec("ram_usage_ratio", System, 0.85, AboveIsBad, High, 10),
                spec("swap_usage_ratio", System, 0.5, AboveIsBad, High, 8),
                spec("process_count", System, 500.0, AboveIsBad, High, 5),
                spec("thread_count", System, 2000.0, AboveIsBad, High, 5),
                spec("handle_count", System, 10000.0, AboveIsBad, High, 5),
                // Network
                spec("download_speed", Network, 10.0, BelowIsBad, High, 5),
                spec("upload_speed", Network, 1.0, BelowIsBad, High, 3),
                spec("packet_loss", Network, 0.01, AboveIsBad, Critical, 10),
                spec("jitter", Network, 20.0, AboveIsBad, High, 5),
                spec("dns_resolution_time", Network, 50.0, AboveIsBad, High, 5),
                // Game loop
                spec("frame_time_variance", Game, 5.0, AboveIsBad, High, 8),
                spec("input_latency", Game, 20.0, AboveIsBad, High, 10),
                spec("audio_latency", Game, 20.0, AboveIsBad, High, 5),
                spec("render_latency", Game, 50.0, AboveIsBad, High, 8),
                spec("draw_calls", Game, 5000.0, AboveIsBad, High, 5),
                spec("triangle_count", Game, 1_000_000.0, AboveIsBad, High, 5),
            ],
        }
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::default_table()
    }
}
