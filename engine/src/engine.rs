//! Telemetry engine orchestration
//!
//! One engine instance owns the whole pipeline: sessions, sampler,
//! evaluation, scoring, and history. Ticks are serialized so a snapshot and
//! the alerts derived from it land in history together; reads go through a
//! separate lock and never block on an in-flight tick for longer than the
//! history write itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::alert::Alert;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::history::{HistoryStore, Report};
use crate::sampler::{MetricSampler, Producer};
use crate::score;
use crate::snapshot::Snapshot;
use crate::thresholds::{Severity, ThresholdTable};

/// The performance telemetry and alerting engine
pub struct TelemetryEngine {
    thresholds: ThresholdTable,
    sampler: MetricSampler,
    history: RwLock<HistoryStore>,
    sessions: Mutex<HashMap<String, Instant>>,
    tick_lock: tokio::sync::Mutex<()>,
}

impl TelemetryEngine {
    /// Build an engine from validated configuration and a producer set
    ///
    /// Configuration errors are fatal at construction: a malformed threshold
    /// table must never silently disable alerting at runtime.
    pub fn new(config: EngineConfig, producers: Vec<Arc<dyn Producer>>) -> Result<Self> {
        config.validate()?;

        info!(
            thresholds = config.thresholds.len(),
            producers = producers.len(),
            snapshot_capacity = config.history.snapshot_capacity,
            alert_capacity = config.history.alert_capacity,
            "telemetry engine initialized"
        );

        Ok(Self {
            thresholds: config.thresholds.clone(),
            sampler: MetricSampler::new(
                producers,
                Duration::from_millis(config.sampler.producer_timeout_ms),
            ),
            history: RwLock::new(HistoryStore::new(
                config.history.snapshot_capacity,
                config.history.alert_capacity,
            )),
            sessions: Mutex::new(HashMap::new()),
            tick_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Open a measurement session for a label
    ///
    /// A second start for the same label rebases the clock: the earlier
    /// start is discarded and the eventual stop measures from here.
    pub fn start_monitoring(&self, label: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.insert(label.to_string(), Instant::now()).is_some() {
            warn!(label, "session already open, restarting its clock");
        } else {
            debug!(label, "session opened");
        }
    }

    /// Close a session, take a snapshot, and record the results
    ///
    /// The elapsed time since the matching start becomes the snapshot's
    /// render time. A stop with no matching start is recorded anyway with
    /// zero elapsed, so the tick is never lost, only its timing is.
    pub async fn stop_monitoring(&self, label: &str) -> Result<Snapshot> {
        let started = self.sessions.lock().unwrap().remove(label);

        let render_time_ms = match started {
            Some(start) => start.elapsed().as_secs_f64() * 1000.0,
            None => {
                warn!(label, "stop without matching start, recording zero elapsed");
                0.0
            }
        };

        self.tick(label, render_time_ms).await
    }

    /// Take an on-demand snapshot without touching session state
    pub async fn sample_now(&self, label: &str) -> Result<Snapshot> {
        self.tick(label, 0.0).await
    }

    /// One full pipeline pass: sample, evaluate, score, store
    async fn tick(&self, label: &str, render_time_ms: f64) -> Result<Snapshot> {
        let _serialized = self.tick_lock.lock().await;

        let snapshot = self.sampler.sample(label, render_time_ms).await;
        let alerts = self.thresholds.evaluate(&snapshot);
        let score = score::score(&snapshot, &self.thresholds);

        for alert in &alerts {
            match alert.severity {
                Severity::Critical | Severity::High => error!(
                    metric = %alert.metric,
                    category = %alert.category,
                    severity = ?alert.severity,
                    actual = alert.actual_value,
                    limit = alert.threshold_value,
                    "{}", alert.message
                ),
                Severity::Medium | Severity::Low => warn!(
                    metric = %alert.metric,
                    category = %alert.category,
                    severity = ?alert.severity,
                    actual = alert.actual_value,
                    limit = alert.threshold_value,
                    "{}", alert.message
                ),
            }
        }

        {
            let mut history = self.history.write().unwrap();
            history.append_snapshot(snapshot.clone());
            history.append_alerts(alerts.iter().cloned());
        }

        info!(
            label,
            render_time_ms,
            score,
            alerts = alerts.len(),
            "recorded snapshot"
        );

        Ok(snapshot)
    }

    /// The most recent snapshot, if any history exists
    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.history.read().unwrap().latest().cloned()
    }

    /// Retained alerts newer than `now - window`, oldest first
    pub fn active_alerts(&self, window: Duration) -> Vec<Alert> {
        self.history.read().unwrap().alerts_since(window)
    }

    /// Health score of the most recent snapshot; 0 when no history exists
    pub fn current_score(&self) -> u8 {
        self.history
            .read()
            .unwrap()
            .latest()
            .map(|snapshot| score::score(snapshot, &self.thresholds))
            .unwrap_or(0)
    }

    /// Export the retained history as a report
    pub fn export_report(&self) -> Report {
        self.history
            .read()
            .unwrap()
            .export(&self.thresholds, self.sampler.failures())
    }

    /// Drop all retained alerts; snapshots are unaffected
    pub fn clear_alerts(&self) {
        self.history.write().unwrap().clear_alerts();
        debug!("alert history cleared");
    }

    /// Producer failures and timeouts absorbed since construction
    pub fn producer_failures(&self) -> u64 {
        self.sampler.failures()
    }

    /// The threshold table this engine evaluates against
    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProducerResult;
    use crate::snapshot::MetricCategory;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct FixedProducer {
        category: MetricCategory,
        values: BTreeMap<String, f64>,
    }

    #[async_trait]
    impl Producer for FixedProducer {
        fn category(&self) -> MetricCategory {
            self.category
        }

        async fn collect(&self) -> ProducerResult<BTreeMap<String, f64>> {
            Ok(self.values.clone())
        }
    }

    fn engine_with(values: &[(MetricCategory, &str, f64)]) -> TelemetryEngine {
        let mut by_category: BTreeMap<MetricCategory, BTreeMap<String, f64>> = BTreeMap::new();
        for (category, metric, value) in values {
            by_category
                .entry(*category)
                .or_default()
                .insert(metric.to_string(), *value);
        }

        let producers: Vec<Arc<dyn Producer>> = by_category
            .into_iter()
            .map(|(category, values)| {
                Arc::new(FixedProducer { category, values }) as Arc<dyn Producer>
            })
            .collect();

        TelemetryEngine::new(EngineConfig::default(), producers).unwrap()
    }

    #[tokio::test]
    async fn test_unmatched_stop_records_zero_elapsed() {
        let engine = engine_with(&[]);
        let snapshot = engine.stop_monitoring("never-started").await.unwrap();
        assert_eq!(snapshot.render_time_ms, 0.0);
        assert_eq!(engine.latest_snapshot().unwrap().label, "never-started");
    }

    #[tokio::test]
    async fn test_duplicate_start_rebases_clock() {
        let engine = engine_with(&[]);
        engine.start_monitoring("store");
        tokio::time::sleep(Duration::from_millis(30)).await;
        engine.start_monitoring("store");

        let snapshot = engine.stop_monitoring("store").await.unwrap();
        // Measured from the second start, so well under the first sleep.
        assert!(snapshot.render_time_ms < 30.0);
    }

    #[tokio::test]
    async fn test_current_score_is_zero_without_history() {
        let engine = engine_with(&[]);
        assert_eq!(engine.current_score(), 0);
        assert!(engine.latest_snapshot().is_none());

        // A healthy sample brings the score up from the empty-history zero.
        engine.sample_now("store").await.unwrap();
        assert_eq!(engine.current_score(), 100);
    }

    #[tokio::test]
    async fn test_breach_produces_alert_and_penalty() {
        let engine = engine_with(&[(MetricCategory::Gpu, "gpu_temperature", 92.0)]);
        engine.sample_now("settings").await.unwrap();

        let alerts = engine.active_alerts(Duration::from_secs(60));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, "gpu_temperature");
        assert_eq!(engine.current_score(), 85);
    }

    #[tokio::test]
    async fn test_clear_alerts_keeps_snapshots() {
        let engine = engine_with(&[(MetricCategory::Gpu, "gpu_temperature", 92.0)]);
        engine.sample_now("a").await.unwrap();

        engine.clear_alerts();
        assert!(engine.active_alerts(Duration::from_secs(60)).is_empty());
        assert!(engine.latest_snapshot().is_some());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.history.snapshot_capacity = 0;
        assert!(TelemetryEngine::new(config, Vec::new()).is_err());
    }
}
