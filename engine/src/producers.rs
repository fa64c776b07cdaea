//! Bundled producers backed by real system data
//!
//! The launcher's old client fabricated GPU/disk/network readings with a
//! random-number generator; that never ships here. These producers report
//! only what `sysinfo` can actually measure: system, disk, and network
//! categories. GPU and game-loop readings have no portable source, so
//! those categories are left to the embedding application (the render loop
//! and its graphics backend), and tests use fakes.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use sysinfo::{Disks, Networks, System};

use crate::error::ProducerResult;
use crate::sampler::Producer;
use crate::snapshot::MetricCategory;

/// CPU, memory, swap, and process readings for the `system` category
pub struct SystemProducer {
    system: Mutex<System>,
}

impl SystemProducer {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_all()),
        }
    }
}

impl Default for SystemProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Producer for SystemProducer {
    fn category(&self) -> MetricCategory {
        MetricCategory::System
    }

    async fn collect(&self) -> ProducerResult<BTreeMap<String, f64>> {
        let mut system = self.system.lock().unwrap();
        system.refresh_cpu();
        system.refresh_memory();
        system.refresh_processes();

        let mut values = BTreeMap::new();
        values.insert(
            "cpu_usage".to_string(),
            f64::from(system.global_cpu_info().cpu_usage()),
        );

        if system.total_memory() > 0 {
            values.insert(
                "ram_usage_ratio".to_string(),
                system.used_memory() as f64 / system.total_memory() as f64,
            );
        }

        if system.total_swap() > 0 {
            values.insert(
                "swap_usage_ratio".to_string(),
                system.used_swap() as f64 / system.total_swap() as f64,
            );
        }

        values.insert("process_count".to_string(), system.processes().len() as f64);

        Ok(values)
    }
}

/// Aggregate disk usage for the `disk` category
pub struct DiskProducer {
    disks: Mutex<Disks>,
}

impl DiskProducer {
    pub fn new() -> Self {
        Self {
            disks: Mutex::new(Disks::new_with_refreshed_list()),
        }
    }
}

impl Default for DiskProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Producer for DiskProducer {
    fn category(&self) -> MetricCategory {
        MetricCategory::Disk
    }

    async fn collect(&self) -> ProducerResult<BTreeMap<String, f64>> {
        let mut disks = self.disks.lock().unwrap();
        disks.refresh();

        let mut total: u64 = 0;
        let mut available: u64 = 0;
        for disk in disks.list() {
            total += disk.total_space();
            available += disk.available_space();
        }

        let mut values = BTreeMap::new();
        if total > 0 {
            values.insert(
                "disk_usage_ratio".to_string(),
                (total - available) as f64 / total as f64,
            );
        }

        Ok(values)
    }
}

/// Interface throughput for the `network` category
///
/// Speeds are derived from byte deltas between refreshes, reported in
/// Mbps to match the threshold table's units.
pub struct NetworkProducer {
    state: Mutex<NetworkState>,
}

struct NetworkState {
    networks: Networks,
    last_refresh: Instant,
}

impl NetworkProducer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NetworkState {
                networks: Networks::new_with_refreshed_list(),
                last_refresh: Instant::now(),
            }),
        }
    }
}

impl Default for NetworkProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Producer for NetworkProducer {
    fn category(&self) -> MetricCategory {
        MetricCategory::Network
    }

    async fn collect(&self) -> ProducerResult<BTreeMap<String, f64>> {
        let mut state = self.state.lock().unwrap();
        let elapsed = state.last_refresh.elapsed().as_secs_f64();
        state.networks.refresh();
        state.last_refresh = Instant::now();

        let mut values = BTreeMap::new();
        if elapsed > 0.0 {
            let (mut received, mut transmitted) = (0u64, 0u64);
            for (_name, data) in state.networks.iter() {
                received += data.received();
                transmitted += data.transmitted();
            }

            let to_mbps = |bytes: u64| (bytes as f64 * 8.0) / elapsed / 1_000_000.0;
            values.insert("download_speed".to_string(), to_mbps(received));
            values.insert("upload_speed".to_string(), to_mbps(transmitted));
        }

        Ok(values)
    }
}

/// The full set of bundled producers
pub fn default_producers() -> Vec<std::sync::Arc<dyn Producer>> {
    vec![
        std::sync::Arc::new(SystemProducer::new()),
        std::sync::Arc::new(DiskProducer::new()),
        std::sync::Arc::new(NetworkProducer::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_producer_reports_real_readings() {
        let producer = SystemProducer::new();
        let values = producer.collect().await.unwrap();

        let cpu = values.get("cpu_usage").copied().unwrap();
        assert!((0.0..=100.0 * 128.0).contains(&cpu)); // per-core sums can exceed 100

        let ram = values.get("ram_usage_ratio").copied().unwrap();
        assert!((0.0..=1.0).contains(&ram));
    }

    #[tokio::test]
    async fn test_disk_producer_ratio_is_bounded() {
        let producer = DiskProducer::new();
        let values = producer.collect().await.unwrap();

        if let Some(ratio) = values.get("disk_usage_ratio") {
            assert!((0.0..=1.0).contains(ratio));
        }
    }

    #[tokio::test]
    async fn test_network_producer_speeds_are_non_negative() {
        let producer = NetworkProducer::new();
        let values = producer.collect().await.unwrap();

        for metric in ["download_speed", "upload_speed"] {
            if let Some(speed) = values.get(metric) {
                assert!(*speed >= 0.0);
            }
        }
    }
}
