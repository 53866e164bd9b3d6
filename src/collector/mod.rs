// Poll orchestration: list -> fetch (bounded fan-out) -> reconcile -> emit.

pub mod emit;
pub mod series;
pub mod store;

use crate::charts::{SeriesRegistry, summary_chart};
use crate::error::CollectError;
use crate::models::{ContainerRef, NetCounters};
use crate::runtime::RuntimeClient;
use emit::RateSample;
use futures_util::stream::{self, StreamExt};
use series::ContainerSeries;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use store::SnapshotStore;

/// Extra time granted to a stats fetch over the general call timeout; stats
/// documents are larger and slower than listings.
pub const FETCH_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Seconds between polls; also the rate divisor.
    pub update_every: u64,
    /// Timeout for connecting and listing. Fetches get `FETCH_TIMEOUT_MARGIN` on top.
    pub timeout: Duration,
    /// Upper bound on stats fetches in flight at once.
    pub max_concurrent_fetches: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            update_every: 1,
            timeout: Duration::from_secs(2),
            max_concurrent_fetches: 16,
        }
    }
}

/// Result of one completed poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    pub metrics: BTreeMap<String, i64>,
    /// Containers in this poll's listing.
    pub containers: usize,
    /// Containers whose stats could not be fetched this poll.
    pub failed: usize,
}

enum Observation {
    Baseline,
    Reset,
    Rate { tx: i64, rx: i64 },
}

pub struct NetworkCollector {
    runtime: Arc<dyn RuntimeClient>,
    config: CollectorConfig,
    store: SnapshotStore,
    series: Mutex<ContainerSeries>,
    /// Serialises cycles; a poll never overlaps the previous one.
    cycle: tokio::sync::Mutex<()>,
}

impl NetworkCollector {
    pub fn new(
        runtime: Arc<dyn RuntimeClient>,
        registry: Arc<dyn SeriesRegistry>,
        config: CollectorConfig,
    ) -> Self {
        if let Err(e) = registry.add(summary_chart()) {
            tracing::warn!(error = %e, operation = "add_summary_chart", "chart registration failed");
        }
        Self {
            runtime,
            config,
            store: SnapshotStore::new(),
            series: Mutex::new(ContainerSeries::new(registry)),
            cycle: tokio::sync::Mutex::new(()),
        }
    }

    /// Display names that currently have charts.
    pub fn active_series(&self) -> Vec<String> {
        self.series
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active_names()
    }

    pub fn snapshot(&self, id: &str) -> Option<NetCounters> {
        self.store.get(id)
    }

    /// Run one poll cycle. Fails only when the runtime cannot be reached or the
    /// container listing fails; in that case nothing in the collector changes.
    /// The runtime connection is released on every exit path.
    pub async fn collect(&self) -> Result<Collected, CollectError> {
        let _cycle = self.cycle.lock().await;
        let result = self.run_cycle().await;
        self.runtime.release().await;
        result
    }

    async fn run_cycle(&self) -> Result<Collected, CollectError> {
        self.runtime.ensure_connected().await?;
        let containers = self.runtime.list_containers(self.config.timeout).await?;

        let fetch_timeout = self.config.timeout + FETCH_TIMEOUT_MARGIN;
        let mut observed: Vec<(usize, Observation)> = stream::iter(0..containers.len())
            .map(|i| {
                let c = &containers[i];
                async move { self.observe(c, fetch_timeout).await.map(|o| (i, o)) }
            })
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .filter_map(std::future::ready)
            .collect()
            .await;
        observed.sort_by_key(|(i, _)| *i);

        let failed = containers.len() - observed.len();
        let samples = self.reconcile(&containers, &observed);
        let metrics = emit::emit(&samples);

        tracing::debug!(
            containers = containers.len(),
            failed,
            emitted = samples.len(),
            "poll complete"
        );
        Ok(Collected {
            metrics,
            containers: containers.len(),
            failed,
        })
    }

    /// Fetch one container and fold it into the snapshot store. `None` when the
    /// fetch failed; the stored snapshot is then left untouched.
    async fn observe(&self, container: &ContainerRef, timeout: Duration) -> Option<Observation> {
        let current = match self.runtime.fetch_stats(&container.id, timeout).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    container = %container.name,
                    error = %e,
                    operation = "fetch_stats",
                    "skipping container this poll"
                );
                return None;
            }
        };

        let Some(previous) = self.store.put(&container.id, current) else {
            return Some(Observation::Baseline);
        };
        let interval = self.config.update_every.max(1);
        match (
            per_second(previous.tx_bytes, current.tx_bytes, interval),
            per_second(previous.rx_bytes, current.rx_bytes, interval),
        ) {
            (Some(tx), Some(rx)) => Some(Observation::Rate { tx, rx }),
            _ => {
                tracing::debug!(
                    container = %container.name,
                    "network counters went backwards; re-baselining"
                );
                Some(Observation::Reset)
            }
        }
    }

    /// Runs after every fetch has settled: purge snapshots of vanished
    /// containers, bring the series set in line with this poll's listing, and
    /// collect the samples to emit. A container that is listed but failed to
    /// fetch keeps its series; only absence from the listing retires it.
    fn reconcile(
        &self,
        containers: &[ContainerRef],
        observed: &[(usize, Observation)],
    ) -> Vec<RateSample> {
        let live: HashSet<&str> = containers.iter().map(|c| c.id.as_str()).collect();
        for id in self.store.retain_ids(&live) {
            tracing::debug!(id = %id, "snapshot purged");
        }
        let listed: HashSet<&str> = containers.iter().map(|c| c.name.as_str()).collect();

        let mut seen: Vec<&str> = Vec::with_capacity(observed.len());
        let mut claimed: HashSet<&str> = HashSet::with_capacity(observed.len());
        let mut samples = Vec::new();
        for (i, observation) in observed {
            let container = &containers[*i];
            if !claimed.insert(container.name.as_str()) {
                tracing::warn!(
                    container = %container.name,
                    id = %container.id,
                    "display name already claimed by another container this poll; not emitted"
                );
                continue;
            }
            seen.push(&container.name);
            if let Observation::Rate { tx, rx } = observation {
                samples.push(RateSample {
                    name: container.name.clone(),
                    tx: *tx,
                    rx: *rx,
                });
            }
        }

        let mut series = self.series.lock().unwrap_or_else(PoisonError::into_inner);
        for name in seen {
            if !series.is_active(name) {
                series.add_series_for(name);
            }
        }
        for name in series.active_names() {
            if !listed.contains(name.as_str()) {
                series.remove_series_for(&name);
            }
        }

        samples
    }
}

/// `None` when the counter went backwards (reset).
fn per_second(previous: u64, current: u64, interval: u64) -> Option<i64> {
    let delta = current.checked_sub(previous)?;
    Some(i64::try_from(delta / interval).unwrap_or(i64::MAX))
}
