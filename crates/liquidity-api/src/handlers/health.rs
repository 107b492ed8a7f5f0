//! Operational endpoints (§6): liveness/readiness probes and build info.
//! None of these carry zone semantics - they exist so the gateway can be
//! wired into a standard orchestrator health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
}

/// `/alive`: the process is up and able to answer HTTP requests at all.
pub async fn alive() -> StatusCode {
    StatusCode::OK
}

/// `/ready`: the gateway can currently route commands - i.e. the Sharding
/// Router is constructed and able to look up or spawn validators. There is
/// no external dependency to probe here (the journal is reached lazily, per
/// zone, not eagerly at startup).
pub async fn ready(State(state): State<Arc<AppState>>) -> StatusCode {
    let _ = state.router.active_zone_count();
    StatusCode::OK
}

/// `/version`: build info for deploy tooling.
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
