// Container runtime access via bollard

mod stats;

use crate::error::CollectError;
use crate::models::{ContainerRef, NetCounters};
use async_trait::async_trait;
use bollard::query_parameters::{ListContainersOptions, StatsOptions};
use bollard::{API_DEFAULT_VERSION, ClientVersion, Docker};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::instrument;

/// What the collector needs from a container runtime.
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Lazily create the client and negotiate the API version. Idempotent.
    async fn ensure_connected(&self) -> Result<(), CollectError>;

    /// Currently running containers.
    async fn list_containers(&self, timeout: Duration) -> Result<Vec<ContainerRef>, CollectError>;

    /// One (non-streamed) stats sample for a single container.
    async fn fetch_stats(&self, id: &str, timeout: Duration) -> Result<NetCounters, CollectError>;

    /// Drop the underlying connection. The next `ensure_connected` reopens it.
    async fn release(&self);
}

/// Socket used when neither the config nor `DOCKER_HOST` names an endpoint.
pub const DEFAULT_LOCAL_ENDPOINT: &str = "unix:///var/run/docker.sock";

/// Transport chosen for an endpoint string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Connector {
    Unix(String),
    Http(String),
}

/// An empty `endpoint` defers to `docker_host`, then to the local socket.
/// `None` for schemes bollard cannot reach from here (ssh, npipe, ...).
fn connector_for(endpoint: &str, docker_host: Option<&str>) -> Option<Connector> {
    let addr = match endpoint {
        "" => docker_host
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_LOCAL_ENDPOINT),
        e => e,
    };
    if addr.starts_with("unix://") || addr.starts_with('/') {
        Some(Connector::Unix(addr.to_string()))
    } else if addr.starts_with("tcp://") || addr.starts_with("http://") {
        Some(Connector::Http(addr.to_string()))
    } else {
        None
    }
}

#[derive(Default)]
struct Connection {
    docker: Option<Docker>,
    /// Kept across `release` so reconnects skip negotiation.
    version: Option<ClientVersion>,
}

pub struct DockerRuntime {
    endpoint: String,
    timeout: Duration,
    conn: Mutex<Connection>,
}

impl DockerRuntime {
    /// `endpoint` is `unix:///path`, `tcp://host:port`, `http://host:port`, or empty
    /// for the local default (honours `DOCKER_HOST`). Nothing is opened until the
    /// first `ensure_connected`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            conn: Mutex::new(Connection::default()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Every transport is opened with `version`, so a reconnect after
    /// `release` keeps the negotiated API version.
    fn open(&self, version: &ClientVersion) -> Result<Docker, CollectError> {
        let timeout_secs = self.timeout.as_secs().max(1);
        let docker_host = std::env::var("DOCKER_HOST").ok();
        let opened = match connector_for(&self.endpoint, docker_host.as_deref()) {
            Some(Connector::Unix(addr)) => Docker::connect_with_unix(&addr, timeout_secs, version),
            Some(Connector::Http(addr)) => Docker::connect_with_http(&addr, timeout_secs, version),
            None => {
                return Err(self.connection_error("unsupported endpoint scheme"));
            }
        };
        opened.map_err(|e| self.connection_error(e))
    }

    fn connection_error(&self, reason: impl ToString) -> CollectError {
        CollectError::Connection {
            endpoint: self.endpoint.clone(),
            reason: reason.to_string(),
        }
    }

    async fn client(&self) -> Result<Docker, CollectError> {
        self.conn
            .lock()
            .await
            .docker
            .clone()
            .ok_or_else(|| self.connection_error("not connected"))
    }
}

fn fetch_error(id: &str, e: bollard::errors::Error) -> CollectError {
    use bollard::errors::Error;
    match e {
        Error::JsonDataError { .. } | Error::JsonSerdeError { .. } => CollectError::Decode {
            id: id.to_string(),
            reason: e.to_string(),
        },
        other => CollectError::Fetch {
            id: id.to_string(),
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    #[instrument(skip(self), fields(runtime = "docker", operation = "ensure_connected"))]
    async fn ensure_connected(&self) -> Result<(), CollectError> {
        let mut conn = self.conn.lock().await;
        if conn.docker.is_some() {
            return Ok(());
        }

        if let Some(version) = conn.version.clone() {
            let docker = self.open(&version)?;
            conn.docker = Some(docker);
            return Ok(());
        }

        let docker = self.open(API_DEFAULT_VERSION)?;
        let docker = tokio::time::timeout(self.timeout, docker.negotiate_version())
            .await
            .map_err(|_| {
                self.connection_error(format!(
                    "version negotiation timed out after {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| self.connection_error(e))?;
        let version = docker.client_version();
        tracing::info!(
            endpoint = %self.endpoint,
            api_version = %format!("{}.{}", version.major_version, version.minor_version),
            "Connected to Docker"
        );
        conn.version = Some(version);
        conn.docker = Some(docker);
        Ok(())
    }

    #[instrument(skip(self), fields(runtime = "docker", operation = "list_containers"))]
    async fn list_containers(&self, timeout: Duration) -> Result<Vec<ContainerRef>, CollectError> {
        let docker = self.client().await?;

        let mut filters = HashMap::new();
        filters.insert("status".to_string(), vec!["running".to_string()]);
        let options = ListContainersOptions {
            all: false,
            filters: Some(filters),
            ..Default::default()
        };

        let containers = tokio::time::timeout(timeout, docker.list_containers(Some(options)))
            .await
            .map_err(|_| CollectError::Timeout {
                operation: "list_containers",
                after: timeout,
            })?
            .map_err(|e| CollectError::List(e.to_string()))?;

        Ok(containers
            .iter()
            .filter_map(|c| {
                let id = c.id.as_deref()?;
                Some(ContainerRef::from_runtime(id, c.names.as_deref()))
            })
            .collect())
    }

    #[instrument(skip(self, timeout), fields(runtime = "docker", operation = "fetch_stats"))]
    async fn fetch_stats(&self, id: &str, timeout: Duration) -> Result<NetCounters, CollectError> {
        let docker = self.client().await?;
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };

        let next = tokio::time::timeout(timeout, async {
            let mut stream = docker.stats(id, Some(options));
            stream.next().await
        })
        .await
        .map_err(|_| CollectError::Timeout {
            operation: "fetch_stats",
            after: timeout,
        })?;

        match next {
            Some(Ok(s)) => Ok(stats::network_counters(&s)),
            Some(Err(e)) => Err(fetch_error(id, e)),
            None => Err(CollectError::Fetch {
                id: id.to_string(),
                reason: "empty stats stream".into(),
            }),
        }
    }

    async fn release(&self) {
        self.conn.lock().await.docker = None;
    }
}
