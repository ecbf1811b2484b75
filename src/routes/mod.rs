// HTTP + WebSocket shell boundary

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::models::RowSet;
use crate::providers::{InventoryProvider, ProcessProvider};
use crate::sampler::SamplerHandle;
use crate::sort::DisplayState;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) rows_tx: broadcast::Sender<RowSet>,
    pub(crate) inventory: Arc<dyn InventoryProvider>,
    pub(crate) processes: Arc<dyn ProcessProvider>,
    pub(crate) sampler: SamplerHandle,
    pub(crate) display: Arc<std::sync::Mutex<DisplayState>>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
}

pub fn app(
    rows_tx: broadcast::Sender<RowSet>,
    inventory: Arc<dyn InventoryProvider>,
    processes: Arc<dyn ProcessProvider>,
    sampler: SamplerHandle,
    display: Arc<std::sync::Mutex<DisplayState>>,
    ws_connections: Arc<AtomicUsize>,
) -> Router {
    let state = AppState {
        rows_tx,
        inventory,
        processes,
        sampler,
        display,
        ws_connections,
    };
    Router::new()
        .route("/", get(|| async { "hwscope: hardware telemetry and inventory" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/classes", get(http::classes_handler)) // GET /api/classes
        .route("/api/inventory/{class}", get(http::inventory_handler)) // GET /api/inventory/{class}
        .route("/api/processes", get(http::processes_handler)) // GET /api/processes
        .route("/api/sampler/start", post(http::sampler_start_handler)) // POST /api/sampler/start
        .route("/api/sampler/stop", post(http::sampler_stop_handler)) // POST /api/sampler/stop
        .route("/api/sort", post(http::sort_handler)) // POST /api/sort
        .route("/ws/rows", get(ws::ws_rows)) // WS /ws/rows
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
