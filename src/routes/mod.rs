// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::charts::ChartRegistry;
use crate::models::MetricsFrame;
use crate::worker::CollectorState;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) frames_tx: broadcast::Sender<MetricsFrame>,
    pub(crate) state: Arc<CollectorState>,
    pub(crate) charts: Arc<ChartRegistry>,
}

pub fn app(
    frames_tx: broadcast::Sender<MetricsFrame>,
    state: Arc<CollectorState>,
    charts: Arc<ChartRegistry>,
) -> Router {
    let state = AppState {
        frames_tx,
        state,
        charts,
    };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/health", get(http::health_handler)) // GET /health
        .route("/api/metrics", get(http::metrics_handler)) // GET /api/metrics
        .route("/api/charts", get(http::charts_handler)) // GET /api/charts
        .route("/ws/metrics", get(ws::ws_metrics)) // WS /ws/metrics
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
