// GET/POST handlers: version, classes, one-shot queries, mode and sort events

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::AppState;
use crate::aggregator::InventoryAggregator;
use crate::models::{InventoryRow, ProcessRow, RowSet};
use crate::providers::{ProviderError, classes};
use crate::snapshot::ProcessSnapshotter;
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/classes — inventory class identifiers this backend accepts.
pub(super) async fn classes_handler() -> impl IntoResponse {
    axum::Json(classes::ALL)
}

fn provider_error_response(e: ProviderError) -> (StatusCode, String) {
    let status = match &e {
        ProviderError::UnsupportedClass(_) => StatusCode::NOT_FOUND,
        ProviderError::Unavailable(_) => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

/// Replace the display surface and fan the rows out to attached shells.
fn publish(state: &AppState, rows: RowSet) {
    if let Ok(mut surface) = state.display.lock() {
        surface.replace(rows.clone());
    }
    let _ = state.rows_tx.send(rows);
}

/// GET /api/inventory/{class} — one-shot inventory query. Stops the sampler
/// first so no tick races the surface replacement; on provider failure the
/// previous surface is left untouched.
pub(super) async fn inventory_handler(
    Path(class): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<InventoryRow>>, (StatusCode, String)> {
    state.sampler.stop().await;
    let mut aggregator = InventoryAggregator::new(state.inventory.clone());
    let rows = match aggregator.query(&class).await {
        Ok(rows) => rows.to_vec(),
        Err(e) => {
            tracing::warn!(
                error = %e,
                class = %class,
                operation = "inventory_query",
                "inventory query failed"
            );
            return Err(provider_error_response(e));
        }
    };
    publish(&state, RowSet::Inventory(rows.clone()));
    Ok(Json(rows))
}

/// GET /api/processes — one-shot process snapshot, descending by footprint.
pub(super) async fn processes_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProcessRow>>, (StatusCode, String)> {
    state.sampler.stop().await;
    let snapshotter = ProcessSnapshotter::new(state.processes.clone());
    let rows = match snapshotter.snapshot().await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, operation = "process_snapshot", "process snapshot failed");
            return Err(provider_error_response(e));
        }
    };
    publish(&state, RowSet::Processes(rows.clone()));
    Ok(Json(rows))
}

/// POST /api/sampler/start — switch to live-metrics mode.
pub(super) async fn sampler_start_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.sampler.start().await;
    Json(serde_json::json!({ "running": true }))
}

/// POST /api/sampler/stop — leave live-metrics mode; resolves after the
/// sampler acknowledged, i.e. no further tick will touch the surface.
pub(super) async fn sampler_stop_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.sampler.stop().await;
    Json(serde_json::json!({ "running": false }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SortRequest {
    pub(super) column_index: usize,
}

/// POST /api/sort — column-click event. Toggles the session sort spec,
/// re-sorts whatever the surface currently shows, and republishes it.
pub(super) async fn sort_handler(
    State(state): State<AppState>,
    Json(request): Json<SortRequest>,
) -> Result<Json<RowSet>, StatusCode> {
    let sorted = {
        let mut guard = state
            .display
            .lock()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let surface = &mut *guard;
        let Some(current) = surface.current.as_mut() else {
            // Nothing on the surface yet; a click has nothing to sort.
            return Err(StatusCode::NO_CONTENT);
        };
        let spec = surface.sort.toggle(request.column_index);
        current.sort(spec);
        current.clone()
    };
    let _ = state.rows_tx.send(sorted.clone());
    Ok(Json(sorted))
}
