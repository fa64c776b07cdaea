//! Bounded history store and report export
//!
//! Two independent ring buffers (snapshots and alerts) with strict FIFO
//! eviction at fixed capacity. The store is owned exclusively by the engine
//! instance; overflow is the designed retention behavior, not an error.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::error::Result;
use crate::score;
use crate::snapshot::Snapshot;
use crate::thresholds::ThresholdTable;

/// Bounded in-memory history of snapshots and alerts
#[derive(Debug)]
pub struct HistoryStore {
    snapshots: VecDeque<Snapshot>,
    alerts: VecDeque<Alert>,
    snapshot_capacity: usize,
    alert_capacity: usize,
}

impl HistoryStore {
    pub fn new(snapshot_capacity: usize, alert_capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(snapshot_capacity),
            alerts: VecDeque::with_capacity(alert_capacity),
            snapshot_capacity,
            alert_capacity,
        }
    }

    /// Append a snapshot, evicting the oldest beyond capacity
    pub fn append_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.snapshot_capacity {
            self.snapshots.pop_front();
        }
    }

    /// Append alerts in order, evicting the oldest beyond capacity
    ///
    /// No deduplication across ticks: repeated breaches on consecutive
    /// samples each get their own entry. Readers wanting rate limiting
    /// filter on read, e.g. `alerts_since`.
    pub fn append_alerts(&mut self, alerts: impl IntoIterator<Item = Alert>) {
        for alert in alerts {
            self.alerts.push_back(alert);
        }
        while self.alerts.len() > self.alert_capacity {
            self.alerts.pop_front();
        }
    }

    /// The most recent snapshot, if any
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    /// Alerts newer than `now - window`, oldest first
    pub fn alerts_since(&self, window: std::time::Duration) -> Vec<Alert> {
        let cutoff = ChronoDuration::from_std(window)
            .ok()
            .and_then(|d| Utc::now().checked_sub_signed(d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.alerts
            .iter()
            .filter(|alert| alert.timestamp > cutoff)
            .cloned()
            .collect()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.len()
    }

    pub fn clear_alerts(&mut self) {
        self.alerts.clear();
    }

    /// Export everything retained, plus the summary block
    pub fn export(&self, table: &ThresholdTable, producer_failures: u64) -> Report {
        let labels: BTreeSet<&str> = self.snapshots.iter().map(|s| s.label.as_str()).collect();

        let average_render_time_ms = if self.snapshots.is_empty() {
            0.0
        } else {
            self.snapshots.iter().map(|s| s.render_time_ms).sum::<f64>()
                / self.snapshots.len() as f64
        };

        let summary = ReportSummary {
            generated_at: Utc::now(),
            total_labels: labels.len(),
            average_render_time_ms,
            total_errors: self.latest().map(|s| s.error_count()).unwrap_or(0),
            overall_score: self.latest().map(|s| score::score(s, table)).unwrap_or(0),
            producer_failures,
        };

        Report {
            metrics: self.snapshots.iter().cloned().collect(),
            alerts: self.alerts.iter().cloned().collect(),
            summary,
        }
    }
}

/// Serializable export of the retained history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Retained snapshots, oldest first
    pub metrics: Vec<Snapshot>,

    /// Retained alerts, oldest first
    pub alerts: Vec<Alert>,

    /// Aggregate summary
    pub summary: ReportSummary,
}

/// Summary block of an exported report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    /// When the report was generated
    pub generated_at: DateTime<Utc>,

    /// Distinct route/label count across retained snapshots
    pub total_labels: usize,

    /// Mean render time of retained snapshots, in milliseconds
    pub average_render_time_ms: f64,

    /// Cumulative error count as of the most recent snapshot
    pub total_errors: u64,

    /// Health score of the most recent snapshot (0 when no history)
    pub overall_score: u8,

    /// Producer failures and timeouts absorbed since engine construction
    pub producer_failures: u64,
}

impl Report {
    /// Pretty-printed JSON for the launcher's export button
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
