//! Producer interface and metric sampler
//!
//! Producers are the engine's only window onto the platform: per-category
//! collectors that return raw numeric readings. The sampler drives them,
//! bounds each with a timeout, and assembles one fully-populated snapshot
//! per tick. A producer outage never fails the tick: the sampler falls
//! back to the category's last-known readings and counts the failure.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{ProducerError, ProducerResult};
use crate::snapshot::{BuildInfo, MetricCategory, Snapshot};

/// A per-category source of raw metric readings
///
/// Implementations are external to the core: the engine does not know or
/// care whether values come from OS syscalls, hardware sensors, or the
/// render loop. `collect` must be cheap and non-blocking; the sampler
/// enforces the configured timeout around each call.
#[async_trait]
pub trait Producer: Send + Sync {
    /// The category this producer reports under
    fn category(&self) -> MetricCategory;

    /// Collect the current readings for this category
    async fn collect(&self) -> ProducerResult<BTreeMap<String, f64>>;
}

/// Drives producers and assembles snapshots
pub struct MetricSampler {
    producers: Vec<Arc<dyn Producer>>,
    timeout: Duration,
    last_known: Mutex<BTreeMap<MetricCategory, BTreeMap<String, f64>>>,
    failures: AtomicU64,
}

impl MetricSampler {
    pub fn new(producers: Vec<Arc<dyn Producer>>, timeout: Duration) -> Self {
        Self {
            producers,
            timeout,
            last_known: Mutex::new(BTreeMap::new()),
            failures: AtomicU64::new(0),
        }
    }

    /// Take one snapshot
    ///
    /// All producers run concurrently, each bounded by the timeout. On
    /// failure or timeout the category keeps its last-known readings; a
    /// category that has never succeeded stays absent from the snapshot
    /// (the explicit unavailable sentinel). Never returns an error.
    pub async fn sample(&self, label: &str, render_time_ms: f64) -> Snapshot {
        let collections = self.producers.iter().map(|producer| {
            let producer = Arc::clone(producer);
            let timeout = self.timeout;
            async move {
                let category = producer.category();
                let outcome = match tokio::time::timeout(timeout, producer.collect()).await {
                    Ok(result) => result,
                    Err(_) => Err(ProducerError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                };
                (category, outcome)
            }
        });

        let outcomes = futures::future::join_all(collections).await;

        let mut last_known = self.last_known.lock().await;
        let mut readings: BTreeMap<MetricCategory, BTreeMap<String, f64>> = BTreeMap::new();

        for (category, outcome) in outcomes {
            match outcome {
                Ok(values) => {
                    last_known
                        .entry(category)
                        .or_default()
                        .extend(values.clone());
                    readings.entry(category).or_default().extend(values);
                }
                Err(err) => {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        category = %category,
                        error = %err,
                        "producer failed, reusing last-known readings"
                    );
                    if let Some(previous) = last_known.get(&category) {
                        readings
                            .entry(category)
                            .or_default()
                            .extend(previous.clone());
                    }
                }
            }
        }
        drop(last_known);

        debug!(label, render_time_ms, categories = readings.len(), "sampled snapshot");

        Snapshot {
            timestamp: Utc::now(),
            label: label.to_string(),
            render_time_ms,
            readings,
            build: BuildInfo::current(),
        }
    }

    /// Producer failures and timeouts absorbed since construction
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    struct StaticProducer {
        category: MetricCategory,
        values: BTreeMap<String, f64>,
    }

    #[async_trait]
    impl Producer for StaticProducer {
        fn category(&self) -> MetricCategory {
            self.category
        }

        async fn collect(&self) -> ProducerResult<BTreeMap<String, f64>> {
            Ok(self.values.clone())
        }
    }

    /// Fails on every call after the first
    struct FlakyProducer {
        category: MetricCategory,
        failed_once: AtomicBool,
    }

    #[async_trait]
    impl Producer for FlakyProducer {
        fn category(&self) -> MetricCategory {
            self.category
        }

        async fn collect(&self) -> ProducerResult<BTreeMap<String, f64>> {
            if self.failed_once.swap(true, Ordering::SeqCst) {
                Err(ProducerError::CollectionFailed {
                    reason: "sensor went away".to_string(),
                })
            } else {
                Ok(BTreeMap::from([("gpu_temperature".to_string(), 66.0)]))
            }
        }
    }

    struct HangingProducer;

    #[async_trait]
    impl Producer for HangingProducer {
        fn category(&self) -> MetricCategory {
            MetricCategory::Game
        }

        async fn collect(&self) -> ProducerResult<BTreeMap<String, f64>> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_sample_collects_all_categories() {
        let sampler = MetricSampler::new(
            vec![
                Arc::new(StaticProducer {
                    category: MetricCategory::System,
                    values: BTreeMap::from([("cpu_usage".to_string(), 35.0)]),
                }),
                Arc::new(StaticProducer {
                    category: MetricCategory::Network,
                    values: BTreeMap::from([("download_speed".to_string(), 90.0)]),
                }),
            ],
            Duration::from_millis(250),
        );

        let snapshot = sampler.sample("store", 12.5).await;
        assert_eq!(snapshot.label, "store");
        assert_eq!(snapshot.render_time_ms, 12.5);
        assert_eq!(snapshot.value(MetricCategory::System, "cpu_usage"), Some(35.0));
        assert_eq!(snapshot.value(MetricCategory::Network, "download_speed"), Some(90.0));
        assert_eq!(sampler.failures(), 0);
    }

    #[tokio::test]
    async fn test_failure_reuses_last_known_values() {
        let sampler = MetricSampler::new(
            vec![Arc::new(FlakyProducer {
                category: MetricCategory::Gpu,
                failed_once: AtomicBool::new(false),
            })],
            Duration::from_millis(250),
        );

        let first = sampler.sample("a", 0.0).await;
        assert_eq!(first.value(MetricCategory::Gpu, "gpu_temperature"), Some(66.0));
        assert_eq!(sampler.failures(), 0);

        // Second tick fails; the prior reading carries over and the
        // failure counter increments by exactly one.
        let second = sampler.sample("b", 0.0).await;
        assert_eq!(second.value(MetricCategory::Gpu, "gpu_temperature"), Some(66.0));
        assert_eq!(sampler.failures(), 1);
    }

    #[tokio::test]
    async fn test_never_succeeded_category_stays_absent() {
        struct AlwaysFails;

        #[async_trait]
        impl Producer for AlwaysFails {
            fn category(&self) -> MetricCategory {
                MetricCategory::Disk
            }

            async fn collect(&self) -> ProducerResult<BTreeMap<String, f64>> {
                Err(ProducerError::SourceUnavailable {
                    source_name: "smart".to_string(),
                })
            }
        }

        let sampler = MetricSampler::new(vec![Arc::new(AlwaysFails)], Duration::from_millis(50));
        let snapshot = sampler.sample("a", 0.0).await;
        assert!(!snapshot.readings.contains_key(&MetricCategory::Disk));
        assert_eq!(sampler.failures(), 1);
    }

    #[tokio::test]
    async fn test_slow_producer_is_timed_out() {
        let sampler = MetricSampler::new(
            vec![
                Arc::new(HangingProducer),
                Arc::new(StaticProducer {
                    category: MetricCategory::System,
                    values: BTreeMap::from([("cpu_usage".to_string(), 20.0)]),
                }),
            ],
            Duration::from_millis(20),
        );

        // The hung producer must not stall the tick or the other producer.
        let snapshot = sampler.sample("a", 0.0).await;
        assert_eq!(snapshot.value(MetricCategory::System, "cpu_usage"), Some(20.0));
        assert!(!snapshot.readings.contains_key(&MetricCategory::Game));
        assert_eq!(sampler.failures(), 1);
    }
}
