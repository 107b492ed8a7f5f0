//! Route tables (§6): client-facing zone operations, the diagnostics
//! surface, and the operational endpoints, each as its own `Router` merged
//! together in `lib.rs::create_router`.

use axum::routing::{get, put};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;
use crate::websocket;

/// `PUT /zone`, `PUT /zone/{id}`, `GET /zone/{id}` - the three endpoints a
/// client actually speaks to (§6).
pub fn zone_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/zone", put(handlers::zone::create_zone))
        .route(
            "/zone/:zone_id",
            put(handlers::zone::send_command).get(websocket::connect),
        )
}

/// `GET /diagnostics/events/{persistence_id}`, `GET /diagnostics/zone/{id}`
/// (§6): read-only operational views, not part of the client protocol.
pub fn diagnostics_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/diagnostics/events/:persistence_id",
            get(handlers::diagnostics::events),
        )
        .route(
            "/diagnostics/zone/:zone_id",
            get(handlers::diagnostics::zone_summary),
        )
}

/// `/alive`, `/ready`, `/version` - standard orchestrator probes, no zone
/// semantics (§6).
pub fn operational_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/alive", get(handlers::health::alive))
        .route("/ready", get(handlers::health::ready))
        .route("/version", get(handlers::health::version))
}
