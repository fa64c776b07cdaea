//! Snapshot data model
//!
//! A snapshot is one fully-populated, immutable reading of all tracked
//! metrics at a point in time. It is created by the sampler on each tick
//! and owned by the history store once appended; nothing mutates it after
//! construction.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metric name used for the per-tick render time reading.
pub const RENDER_TIME_METRIC: &str = "render_time";

/// Metric name producers use for the cumulative error counter.
pub const ERROR_COUNT_METRIC: &str = "error_count";

/// Fixed categories every tracked metric belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricCategory {
    /// Render timing, FPS, memory, cache, errors
    CorePerformance,
    Gpu,
    Disk,
    System,
    Network,
    Game,
}

impl MetricCategory {
    /// All categories, in the order they are reported
    pub const ALL: [MetricCategory; 6] = [
        MetricCategory::CorePerformance,
        MetricCategory::Gpu,
        MetricCategory::Disk,
        MetricCategory::System,
        MetricCategory::Network,
        MetricCategory::Game,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::CorePerformance => "core-performance",
            MetricCategory::Gpu => "gpu",
            MetricCategory::Disk => "disk",
            MetricCategory::System => "system",
            MetricCategory::Network => "network",
            MetricCategory::Game => "game",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build and environment information carried on every snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Engine crate version
    pub version: String,

    /// Target operating system
    pub platform: String,

    /// Target architecture
    pub architecture: String,

    /// Build profile (debug/release)
    pub profile: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            profile: if cfg!(debug_assertions) {
                "debug".to_string()
            } else {
                "release".to_string()
            },
        }
    }
}

/// One timestamped reading of every tracked metric
///
/// Readings are grouped by category; a category absent from `readings` is
/// the explicit "unavailable" sentinel for a producer that has never
/// succeeded. BTreeMaps keep serialization and iteration deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Route or component label the tick was attributed to
    pub label: String,

    /// Elapsed render time for the monitored interval, in milliseconds
    pub render_time_ms: f64,

    /// All metric readings, grouped by category
    pub readings: BTreeMap<MetricCategory, BTreeMap<String, f64>>,

    /// Build/environment information
    pub build: BuildInfo,
}

impl Snapshot {
    /// Look up a metric value by category and name
    ///
    /// The render time reading is answered from `render_time_ms` so the
    /// threshold table can reference it like any other metric.
    pub fn value(&self, category: MetricCategory, metric: &str) -> Option<f64> {
        if category == MetricCategory::CorePerformance && metric == RENDER_TIME_METRIC {
            return Some(self.render_time_ms);
        }
        self.readings.get(&category)?.get(metric).copied()
    }

    /// The cumulative error counter reported by the core-performance producer
    pub fn error_count(&self) -> u64 {
        self.value(MetricCategory::CorePerformance, ERROR_COUNT_METRIC)
            .map(|v| v.max(0.0) as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(category: MetricCategory, metric: &str, value: f64) -> Snapshot {
        let mut readings = BTreeMap::new();
        readings
            .entry(category)
            .or_insert_with(BTreeMap::new)
            .insert(metric.to_string(), value);

        Snapshot {
            timestamp: Utc::now(),
            label: "test".to_string(),
            render_time_ms: 42.0,
            readings,
            build: BuildInfo::current(),
        }
    }

    #[test]
    fn test_value_lookup() {
        let snapshot = snapshot_with(MetricCategory::Gpu, "gpu_temperature", 71.5);
        assert_eq!(snapshot.value(MetricCategory::Gpu, "gpu_temperature"), Some(71.5));
        assert_eq!(snapshot.value(MetricCategory::Gpu, "vram_usage_ratio"), None);
        assert_eq!(snapshot.value(MetricCategory::Disk, "gpu_temperature"), None);
    }

    #[test]
    fn test_render_time_is_addressable_as_metric() {
        let snapshot = snapshot_with(MetricCategory::System, "cpu_usage", 30.0);
        assert_eq!(
            snapshot.value(MetricCategory::CorePerformance, RENDER_TIME_METRIC),
            Some(42.0)
        );
    }

    #[test]
    fn test_error_count_defaults_to_zero() {
        let snapshot = snapshot_with(MetricCategory::System, "cpu_usage", 30.0);
        assert_eq!(snapshot.error_count(), 0);

        let snapshot = snapshot_with(MetricCategory::CorePerformance, ERROR_COUNT_METRIC, 3.0);
        assert_eq!(snapshot.error_count(), 3);
    }

    #[test]
    fn test_snapshot_serialization_round_trip() {
        let snapshot = snapshot_with(MetricCategory::Network, "download_speed", 85.2);
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.label, "test");
        assert_eq!(decoded.value(MetricCategory::Network, "download_speed"), Some(85.2));
    }
}
