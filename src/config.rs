use crate::collector::CollectorConfig;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub collector: CollectorSection,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    /// `unix:///path`, `tcp://host:port` or `http://host:port`; empty uses the local default.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-call timeout for connecting and listing. Stats fetches get a margin on top.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    crate::runtime::DEFAULT_LOCAL_ENDPOINT.into()
}

fn default_timeout_secs() -> u64 {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorSection {
    /// Poll cadence in seconds. Rates are normalised by this value, so it must
    /// match the real scheduling interval.
    #[serde(default = "default_update_every")]
    pub update_every: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for CollectorSection {
    fn default() -> Self {
        Self {
            update_every: default_update_every(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

fn default_update_every() -> u64 {
    1
}

fn default_max_concurrent_fetches() -> usize {
    16
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Max number of frames kept in the broadcast channel for /ws/metrics (slow clients may lag).
    pub broadcast_capacity: usize,
    /// How often to log collector stats at INFO level.
    pub stats_log_interval_secs: u64,
    /// Consecutive failed or empty polls before the collector reports unhealthy.
    #[serde(default = "default_unhealthy_after")]
    pub unhealthy_after: u32,
}

fn default_unhealthy_after() -> u32 {
    5
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            update_every: self.collector.update_every,
            timeout: Duration::from_secs(self.docker.timeout_secs),
            max_concurrent_fetches: self.collector.max_concurrent_fetches,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.docker.endpoint.is_empty()
                || ["unix://", "tcp://", "http://", "/"]
                    .iter()
                    .any(|p| self.docker.endpoint.starts_with(p)),
            "docker.endpoint must start with unix://, tcp://, http:// or /, got {:?}",
            self.docker.endpoint
        );
        anyhow::ensure!(
            self.docker.timeout_secs > 0,
            "docker.timeout_secs must be > 0, got {}",
            self.docker.timeout_secs
        );
        anyhow::ensure!(
            self.collector.update_every > 0,
            "collector.update_every must be > 0, got {}",
            self.collector.update_every
        );
        anyhow::ensure!(
            self.collector.max_concurrent_fetches > 0,
            "collector.max_concurrent_fetches must be > 0, got {}",
            self.collector.max_concurrent_fetches
        );
        anyhow::ensure!(
            self.monitoring.broadcast_capacity > 0,
            "monitoring.broadcast_capacity must be > 0, got {}",
            self.monitoring.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.unhealthy_after > 0,
            "monitoring.unhealthy_after must be > 0, got {}",
            self.monitoring.unhealthy_after
        );
        Ok(())
    }
}
