// Poll scheduler: runs one collection per tick, publishes frames, tracks health.

use crate::collector::NetworkCollector;
use crate::models::MetricsFrame;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tokio::time::{Duration, interval};
use tracing::Instrument;

/// Latest frame and poll counters, shared with the HTTP routes.
pub struct CollectorState {
    latest: RwLock<Option<MetricsFrame>>,
    bad_streak: AtomicU32,
    unhealthy_after: u32,
    pub polls_ok: AtomicU64,
    pub polls_failed: AtomicU64,
}

impl CollectorState {
    pub fn new(unhealthy_after: u32) -> Self {
        Self {
            latest: RwLock::new(None),
            bad_streak: AtomicU32::new(0),
            unhealthy_after,
            polls_ok: AtomicU64::new(0),
            polls_failed: AtomicU64::new(0),
        }
    }

    pub fn latest(&self) -> Option<MetricsFrame> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Consecutive polls that failed or produced no container metrics.
    pub fn bad_streak(&self) -> u32 {
        self.bad_streak.load(Ordering::Relaxed)
    }

    pub fn is_healthy(&self) -> bool {
        self.bad_streak() < self.unhealthy_after
    }

    fn record(&self, frame: Option<MetricsFrame>) {
        let empty = frame.as_ref().is_none_or(|f| !has_container_metrics(f));
        match frame {
            Some(f) => {
                self.polls_ok.fetch_add(1, Ordering::Relaxed);
                *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(f);
            }
            None => {
                self.polls_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        if empty {
            let streak = self.bad_streak.fetch_add(1, Ordering::Relaxed) + 1;
            if streak == self.unhealthy_after {
                tracing::warn!(
                    polls = streak,
                    "collector has produced no container metrics for consecutive polls"
                );
            }
        } else {
            self.bad_streak.store(0, Ordering::Relaxed);
        }
    }
}

fn has_container_metrics(frame: &MetricsFrame) -> bool {
    frame.metrics.keys().any(|k| k.starts_with("container_"))
}

pub struct WorkerDeps {
    pub collector: Arc<NetworkCollector>,
    pub state: Arc<CollectorState>,
    pub tx: broadcast::Sender<MetricsFrame>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    pub update_every_secs: u64,
    /// How often to log collector stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Run one collection and publish the result. Returns the frame when the poll
/// succeeded.
pub async fn poll_once(
    collector: &NetworkCollector,
    state: &CollectorState,
    tx: &broadcast::Sender<MetricsFrame>,
) -> Option<MetricsFrame> {
    let frame = match collector.collect().await {
        Ok(collected) => Some(MetricsFrame {
            timestamp: now_millis(),
            containers: collected.containers,
            metrics: collected.metrics,
        }),
        Err(e) => {
            tracing::warn!(
                error = %e,
                fatal = e.is_fatal(),
                operation = "collect",
                "poll failed"
            );
            None
        }
    };
    state.record(frame.clone());
    if let Some(f) = &frame
        && tx.send(f.clone()).is_err()
    {
        tracing::trace!(
            operation = "broadcast_frame",
            "no active WebSocket clients; broadcast channel has no receivers"
        );
    }
    frame
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        collector,
        state,
        tx,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        update_every_secs,
        stats_log_interval_secs,
    } = config;

    let worker_span = tracing::span!(tracing::Level::DEBUG, "worker", update_every_secs);
    tokio::spawn(
        async move {
            let mut tick = interval(Duration::from_secs(update_every_secs));
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
            stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        poll_once(&collector, &state, &tx).await;
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Worker shutting down");
                        break;
                    }
                    _ = stats_log_tick.tick() => {
                        tracing::info!(
                            polls_ok = state.polls_ok.load(Ordering::Relaxed),
                            polls_failed = state.polls_failed.load(Ordering::Relaxed),
                            active_series = collector.active_series().len(),
                            ws_clients = tx.receiver_count(),
                            "collector stats"
                        );
                    }
                }
            }
        }
        .instrument(worker_span),
    )
}
