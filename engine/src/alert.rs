//! Alert data model and remediation policy
//!
//! Alerts are the structured replacement for the launcher's old
//! console-log alerting channel: immutable records of one threshold
//! breach, carrying severity, remediation text, and the auto-fix policy
//! flag. They expire only by falling out of the bounded alert log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::snapshot::MetricCategory;
use crate::thresholds::{Severity, ThresholdSpec};

/// A structured record of one threshold breach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert identity
    pub id: Uuid,

    /// Metric that breached its threshold
    pub metric: String,

    /// Human-readable breach description
    pub message: String,

    /// Category the metric belongs to
    pub category: MetricCategory,

    /// Severity assigned by the threshold table
    pub severity: Severity,

    /// The configured limit
    pub threshold_value: f64,

    /// The observed value
    pub actual_value: f64,

    /// When the breach was observed
    pub timestamp: DateTime<Utc>,

    /// Route or component label of the tick that produced the breach
    pub label: String,

    /// Remediation hint for the user
    pub recommendation: String,

    /// Whether the launcher can remediate this automatically
    pub auto_fix_available: bool,
}

impl Alert {
    /// Build an alert for one breached threshold entry
    pub fn from_breach(spec: &ThresholdSpec, actual: f64, label: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            metric: spec.metric.clone(),
            message: format!(
                "{} threshold breached: {:.2} (limit: {})",
                spec.metric, actual, spec.limit
            ),
            category: spec.category,
            severity: spec.severity,
            threshold_value: spec.limit,
            actual_value: actual,
            timestamp: Utc::now(),
            label: label.to_string(),
            recommendation: recommendation(spec.category, &spec.metric),
            auto_fix_available: has_auto_fix(spec.category, &spec.metric),
        }
    }
}

/// Remediation text, keyed by category plus a keyword match on the metric
///
/// A fixed lookup table, not an inference. Unmatched metrics fall through
/// to a generic hint.
pub fn recommendation(category: MetricCategory, metric: &str) -> String {
    let hint = match category {
        MetricCategory::Gpu => {
            if metric.contains("usage") {
                Some("Consider lowering graphics settings or closing other GPU-intensive applications")
            } else if metric.contains("temperature") {
                Some("Check GPU cooling and increase fan speed")
            } else if metric.contains("vram") {
                Some("Reduce texture quality or resolution")
            } else {
                None
            }
        }
        MetricCategory::Disk => {
            if metric.contains("read_speed") {
                Some("Consider upgrading to SSD or defragmenting disk")
            } else if metric.contains("write_speed") {
                Some("Free up disk space or check for disk errors")
            } else if metric.contains("usage") {
                Some("Clean up disk space or move files to external storage")
            } else {
                None
            }
        }
        MetricCategory::System => {
            if metric.contains("cpu_usage") {
                Some("Close unnecessary applications or upgrade CPU")
            } else if metric.contains("ram") {
                Some("Close memory-intensive applications or add more RAM")
            } else if metric.contains("temperature") {
                Some("Check system cooling and clean dust from fans")
            } else {
                None
            }
        }
        MetricCategory::Network => {
            if metric.contains("download_speed") {
                Some("Check internet connection or contact ISP")
            } else if metric.contains("packet_loss") {
                Some("Restart router or check network cables")
            } else if metric.contains("latency") || metric.contains("jitter") {
                Some("Use wired connection or move closer to router")
            } else {
                None
            }
        }
        MetricCategory::Game => {
            if metric.contains("input_latency") {
                Some("Check controller settings or reduce input lag")
            } else if metric.contains("frame_time") {
                Some("Enable VSync or reduce graphics settings")
            } else {
                None
            }
        }
        MetricCategory::CorePerformance => {
            if metric.contains("cache") {
                Some("Clear the launcher cache from settings")
            } else if metric.contains("memory") {
                Some("Restart the launcher to release memory")
            } else {
                None
            }
        }
    };

    hint.unwrap_or("Monitor the situation and consider system optimization")
        .to_string()
}

/// Auto-fix eligibility policy
///
/// True for cache/memory-related breaches and the core-performance
/// category; everything else requires user action.
pub fn has_auto_fix(category: MetricCategory, metric: &str) -> bool {
    metric.contains("cache")
        || metric.contains("memory")
        || category == MetricCategory::CorePerformance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::Direction;

    fn spec(metric: &str, category: MetricCategory) -> ThresholdSpec {
        ThresholdSpec {
            metric: metric.to_string(),
            category,
            limit: 85.0,
            direction: Direction::AboveIsBad,
            severity: Severity::Critical,
            penalty: 15,
        }
    }

    #[test]
    fn test_alert_from_breach() {
        let alert = Alert::from_breach(&spec("gpu_temperature", MetricCategory::Gpu), 91.3, "library");
        assert_eq!(alert.metric, "gpu_temperature");
        assert_eq!(alert.threshold_value, 85.0);
        assert_eq!(alert.actual_value, 91.3);
        assert_eq!(alert.label, "library");
        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.message.contains("gpu_temperature"));
        assert!(alert.recommendation.contains("cooling"));
    }

    #[test]
    fn test_recommendation_keyword_lookup() {
        assert!(recommendation(MetricCategory::Disk, "disk_read_speed").contains("SSD"));
        assert!(recommendation(MetricCategory::Network, "packet_loss").contains("router"));
        assert!(recommendation(MetricCategory::Game, "input_latency").contains("input lag"));
        // Unmatched metric falls through to the generic hint.
        assert!(recommendation(MetricCategory::Gpu, "gpu_fan_speed").contains("Monitor the situation"));
    }

    #[test]
    fn test_auto_fix_policy() {
        assert!(has_auto_fix(MetricCategory::CorePerformance, "fps"));
        assert!(has_auto_fix(MetricCategory::CorePerformance, "cache_hit_rate"));
        assert!(has_auto_fix(MetricCategory::System, "memory_pressure"));
        assert!(!has_auto_fix(MetricCategory::Gpu, "gpu_temperature"));
        assert!(!has_auto_fix(MetricCategory::Network, "packet_loss"));
    }
}
