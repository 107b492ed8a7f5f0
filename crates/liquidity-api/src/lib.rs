//! The Liquidity gateway's HTTP/WebSocket surface (§6 of the spec).
//!
//! This crate is the external collaborator the spec calls the "HTTP/websocket
//! gateway": it terminates caller connections, authenticates them (via
//! `liquidity-auth`'s self-asserted identity tokens), and forwards commands
//! to the zone they're addressed to through `liquidity-router`'s
//! `ShardedZoneRouter`. None of the zone's own logic - validation, event
//! application, notification sequencing - lives here; this crate only
//! carries bytes to and from the validator.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod websocket;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the full gateway router: client-facing zone operations, the
/// diagnostics surface, and the operational endpoints (§6).
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::zone_routes())
        .merge(routes::diagnostics_routes())
        .merge(routes::operational_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
