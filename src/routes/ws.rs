// WebSocket row-replace stream to the presentation shell

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::RowSet;
use crate::sort::DisplayState;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements shell connection count on drop (connect = +1, drop = -1).
struct WsRowsGuard(Arc<AtomicUsize>);

impl Drop for WsRowsGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

pub(super) async fn ws_rows(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let tx = state.rows_tx.clone();
    let conn_count = state.ws_connections.clone();
    let display = state.display.clone();
    ws.on_upgrade(move |socket| async move {
        let mut rx = tx.subscribe();
        if let Err(e) = stream_rows(socket, &mut rx, conn_count, display).await {
            tracing::info!("Row stream error: {}", e);
        }
    })
}

async fn stream_rows(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<RowSet>,
    conn_count: Arc<AtomicUsize>,
    display: Arc<std::sync::Mutex<DisplayState>>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let _guard = WsRowsGuard(conn_count);
    tracing::info!("Shell connected to row stream");

    // A late joiner gets whatever the surface currently shows.
    let current = display.lock().ok().and_then(|d| d.current.clone());
    if let Some(rows) = current {
        let json = serde_json::to_string(&rows)?;
        let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
        if r.is_err() || r.unwrap_or(Ok(())).is_err() {
            return Ok(());
        }
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(rows) => {
                        let json = serde_json::to_string(&rows)?;
                        let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
                        if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/rows client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}
