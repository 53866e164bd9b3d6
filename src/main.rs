use anyhow::Result;
use docknet::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let runtime = Arc::new(runtime::DockerRuntime::new(
        app_config.docker.endpoint.clone(),
        Duration::from_secs(app_config.docker.timeout_secs),
    ));
    tracing::info!(
        build = %version::banner(),
        endpoint = %runtime.endpoint(),
        update_every = app_config.collector.update_every,
        "Starting collector"
    );

    let (tx, _) =
        broadcast::channel::<models::MetricsFrame>(app_config.monitoring.broadcast_capacity);
    let charts = Arc::new(charts::ChartRegistry::new());
    let collector = Arc::new(collector::NetworkCollector::new(
        runtime,
        charts.clone(),
        app_config.collector_config(),
    ));
    let state = Arc::new(worker::CollectorState::new(
        app_config.monitoring.unhealthy_after,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            collector,
            state: state.clone(),
            tx: tx.clone(),
            shutdown_rx,
        },
        worker::WorkerConfig {
            update_every_secs: app_config.collector.update_every,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    let app = routes::app(tx, state, charts);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = worker_handle.await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
