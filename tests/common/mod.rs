// Shared test helpers: a scripted container runtime

#![allow(dead_code)]

use async_trait::async_trait;
use docknet::charts::ChartRegistry;
use docknet::collector::{CollectorConfig, NetworkCollector};
use docknet::error::CollectError;
use docknet::models::{ContainerRef, NetCounters};
use docknet::runtime::RuntimeClient;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct ScriptedRuntime {
    inner: Mutex<Script>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

#[derive(Default)]
struct Script {
    containers: Vec<ContainerRef>,
    counters: HashMap<String, NetCounters>,
    failing: HashSet<String>,
    slow: HashMap<String, Duration>,
    unreachable: bool,
    list_fails: bool,
    fetch_timeouts: Vec<Duration>,
}

impl ScriptedRuntime {
    /// Replace the listing: `(id, name, tx, rx)` per container.
    pub fn set(&self, containers: &[(&str, &str, u64, u64)]) {
        let mut s = self.inner.lock().unwrap();
        s.containers = containers
            .iter()
            .map(|(id, name, _, _)| ContainerRef::new(*id, *name))
            .collect();
        s.counters = containers
            .iter()
            .map(|(id, _, tx, rx)| (id.to_string(), NetCounters::new(*tx, *rx)))
            .collect();
    }

    pub fn fail_fetch(&self, id: &str) {
        self.inner.lock().unwrap().failing.insert(id.to_string());
    }

    pub fn delay_fetch(&self, id: &str, delay: Duration) {
        self.inner.lock().unwrap().slow.insert(id.to_string(), delay);
    }

    pub fn fail_listing(&self, fails: bool) {
        self.inner.lock().unwrap().list_fails = fails;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unwrap().unreachable = unreachable;
    }

    /// Most stats fetches that were running at the same moment.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Timeout passed to each `fetch_stats` call, in call order.
    pub fn fetch_timeouts(&self) -> Vec<Duration> {
        self.inner.lock().unwrap().fetch_timeouts.clone()
    }

    async fn scripted_fetch(&self, id: &str, timeout: Duration) -> Result<NetCounters, CollectError> {
        let delay = self.inner.lock().unwrap().slow.get(id).copied();
        if let Some(delay) = delay {
            if delay > timeout {
                tokio::time::sleep(timeout).await;
                return Err(CollectError::Timeout {
                    operation: "fetch_stats",
                    after: timeout,
                });
            }
            tokio::time::sleep(delay).await;
        }
        let s = self.inner.lock().unwrap();
        if s.failing.contains(id) {
            return Err(CollectError::Decode {
                id: id.into(),
                reason: "unexpected end of JSON input".into(),
            });
        }
        s.counters
            .get(id)
            .copied()
            .ok_or_else(|| CollectError::Fetch {
                id: id.into(),
                reason: "No such container".into(),
            })
    }
}

#[async_trait]
impl RuntimeClient for ScriptedRuntime {
    async fn ensure_connected(&self) -> Result<(), CollectError> {
        if self.inner.lock().unwrap().unreachable {
            return Err(CollectError::Connection {
                endpoint: "unix:///var/run/docker.sock".into(),
                reason: "connection refused".into(),
            });
        }
        Ok(())
    }

    async fn list_containers(&self, _: Duration) -> Result<Vec<ContainerRef>, CollectError> {
        let s = self.inner.lock().unwrap();
        if s.list_fails {
            return Err(CollectError::List("503 Service Unavailable".into()));
        }
        Ok(s.containers.clone())
    }

    async fn fetch_stats(&self, id: &str, timeout: Duration) -> Result<NetCounters, CollectError> {
        self.inner.lock().unwrap().fetch_timeouts.push(timeout);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.scripted_fetch(id, timeout).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn release(&self) {}
}

pub fn collector_with(
    update_every: u64,
) -> (Arc<ScriptedRuntime>, Arc<ChartRegistry>, NetworkCollector) {
    collector_with_config(CollectorConfig {
        update_every,
        timeout: Duration::from_secs(1),
        max_concurrent_fetches: 4,
    })
}

pub fn collector_with_config(
    config: CollectorConfig,
) -> (Arc<ScriptedRuntime>, Arc<ChartRegistry>, NetworkCollector) {
    let runtime = Arc::new(ScriptedRuntime::default());
    let registry = Arc::new(ChartRegistry::new());
    let collector = NetworkCollector::new(runtime.clone(), registry.clone(), config);
    (runtime, registry, collector)
}
