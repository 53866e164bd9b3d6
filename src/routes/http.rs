// GET handlers: version, health, latest metrics, chart catalogue

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use super::AppState;
use crate::version::{NAME, VERSION};

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /health: 503 once failed or empty polls reach `monitoring.unhealthy_after`.
pub(super) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = state.state.is_healthy();
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        axum::Json(serde_json::json!({
            "healthy": healthy,
            "badStreak": state.state.bad_streak(),
        })),
    )
}

/// GET /api/metrics: the most recent successful poll, or 204 before the first one.
pub(super) async fn metrics_handler(State(state): State<AppState>) -> axum::response::Response {
    match state.state.latest() {
        Some(frame) => axum::Json(frame).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /api/charts: charts currently declared by the collector.
pub(super) async fn charts_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.charts.charts())
}
