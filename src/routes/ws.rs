// WebSocket stream of poll frames

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::MetricsFrame;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) async fn ws_metrics(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let tx = state.frames_tx.clone();
    let charts = state.charts.clone();
    ws.on_upgrade(move |socket| async move {
        let mut rx = tx.subscribe();
        let welcome = serde_json::json!({ "type": "charts", "charts": charts.charts() });
        if let Err(e) = stream_metrics(socket, &mut rx, welcome).await {
            tracing::info!("Metrics stream error: {}", e);
        }
    })
}

async fn send(socket: &mut WebSocket, msg: Message) -> bool {
    matches!(timeout(WS_SEND_TIMEOUT, socket.send(msg)).await, Ok(Ok(())))
}

async fn stream_metrics(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<MetricsFrame>,
    welcome: serde_json::Value,
) -> anyhow::Result<()> {
    tracing::info!("Client connected to metrics stream");

    let welcome_json = serde_json::to_string(&welcome)?;
    if !send(&mut socket, Message::Text(welcome_json.into())).await {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        let json = serde_json::to_string(&frame)?;
                        if !send(&mut socket, Message::Text(json.into())).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/metrics client lagged, skipped {} frames", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                if !send(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
        }
    }
    Ok(())
}
