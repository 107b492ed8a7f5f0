//! `GET /diagnostics/events/{persistence_id}` and `GET /diagnostics/zone/{id}`
//! (§6): read-only operational views, not part of the client protocol.
//! Neither endpoint is authenticated against a specific zone's membership -
//! in the real deployment these sit behind the admin-JWT gate alongside
//! `/akka-management`.

use axum::extract::{Path, State};
use axum::Json;
use liquidity_router::ZoneSummary;
use liquidity_store::PersistedEnvelope;
use liquidity_types::ZoneId;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Dump a zone's persisted event stream in journal order.
pub async fn events(
    State(state): State<Arc<AppState>>,
    Path(persistence_id): Path<String>,
) -> Result<Json<Vec<PersistedEnvelope>>, ApiError> {
    let records = state.journal.replay(&persistence_id).await.map_err(|e| {
        ApiError::bad_request(format!("failed to read journal: {e}"))
    })?;
    Ok(Json(records))
}

/// The most recently published `ActiveZoneSummary` for one zone (§4.6),
/// aggregated from the `zone-status` topic by the Zone Monitor.
pub async fn zone_summary(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<Uuid>,
) -> Result<Json<ZoneSummary>, ApiError> {
    state
        .monitor
        .get(&ZoneId(zone_id))
        .map(Json)
        .ok_or_else(|| ApiError::not_found("no status summary published for this zone yet"))
}
