//! Shared state handed to every handler: the identity verifier, the
//! sharding router (§5) commands are dispatched through, and the zone
//! monitor diagnostics reads from.

use liquidity_auth::IdentityVerifier;
use liquidity_router::{ShardedZoneRouter, ZoneMonitor};
use liquidity_store::EventJournal;
use std::sync::Arc;

pub struct AppState {
    pub verifier: IdentityVerifier,
    pub router: ShardedZoneRouter,
    pub monitor: ZoneMonitor,
    pub journal: Arc<dyn EventJournal>,
}

impl AppState {
    pub fn new(
        verifier: IdentityVerifier,
        router: ShardedZoneRouter,
        monitor: ZoneMonitor,
        journal: Arc<dyn EventJournal>,
    ) -> Self {
        Self {
            verifier,
            router,
            monitor,
            journal,
        }
    }
}

/// Not `cfg(test)`-gated - `liquidity-crypto::testing` sets the precedent of
/// leaving test helpers reachable from downstream integration test binaries,
/// which compile this crate without `cfg(test)` active.
pub mod testing {
    use super::*;
    use liquidity_auth::AuthConfig;
    use liquidity_store::InMemoryJournal;
    use liquidity_zone::status::BroadcastStatusTopic;

    /// Wire up an in-memory gateway - no network, no Postgres - for handler
    /// tests and the integration test suite.
    pub fn test_state() -> Arc<AppState> {
        let journal: Arc<dyn EventJournal> = Arc::new(InMemoryJournal::new());
        let topic = BroadcastStatusTopic::default();
        let monitor = ZoneMonitor::spawn(&topic);
        let router = ShardedZoneRouter::new(journal.clone(), Arc::new(topic));
        Arc::new(AppState::new(
            IdentityVerifier::new(AuthConfig::default()),
            router,
            monitor,
            journal,
        ))
    }
}
