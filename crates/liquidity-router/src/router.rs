//! The Sharding Router (§5): look up a zone's validator task, spawning one
//! (replaying its journal) on first use, and forget it once it passivates.
//!
//! Grounded in the same `Arc<...>`-registry-behind-a-lock shape as the
//! teacher's ledger account map, but keyed by `dashmap::DashMap` rather than
//! a single `RwLock<HashMap<_>>` so concurrent lookups for distinct zones
//! don't serialize on each other - there is no cross-zone invariant to
//! protect, only the per-zone single-writer one the validator task itself
//! already owns.

use dashmap::DashMap;
use liquidity_store::EventJournal;
use liquidity_types::ZoneId;
use liquidity_zone::status::StatusTopic;
use liquidity_zone::{CommandRequest, Unavailable, ValidatorHandle};
use std::sync::Arc;

/// Routes commands to the validator task that owns each zone, spawning one
/// on demand and replacing it if it has passivated since the last lookup.
pub struct ShardedZoneRouter {
    journal: Arc<dyn EventJournal>,
    status_topic: Arc<dyn StatusTopic>,
    handles: Arc<DashMap<ZoneId, ValidatorHandle>>,
    // Serializes the spawn-if-absent path only; `handles.get` hits above
    // don't take it. Without it, two concurrent first-dispatches for the
    // same brand-new zone could each pass the miss check and spawn a
    // second, orphaned validator - a second writer for one zone.
    spawn_lock: tokio::sync::Mutex<()>,
}

impl ShardedZoneRouter {
    pub fn new(journal: Arc<dyn EventJournal>, status_topic: Arc<dyn StatusTopic>) -> Self {
        Self {
            journal,
            status_topic,
            handles: Arc::new(DashMap::new()),
            spawn_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The shard this zone would be routed to in a multi-node deployment
    /// (§5, `crate::shard::shard_id`). Carried for observability only - see
    /// module docs.
    pub fn shard_id(&self, zone_id: &ZoneId) -> u32 {
        crate::shard::shard_id(zone_id)
    }

    /// Dispatch `request` to `zone_id`'s validator, spawning it first if it
    /// isn't already running or has passivated since the last dispatch.
    pub async fn dispatch(
        &self,
        zone_id: &ZoneId,
        request: CommandRequest,
    ) -> Result<liquidity_types::ZoneResponseEnvelope, Unavailable> {
        // One retry covers the race where the cached handle's validator
        // passivated between our lookup and the send; a second failure
        // means something is actually wrong, so it's surfaced as-is.
        for attempt in 0..2 {
            let handle = self.lookup_or_spawn(zone_id).await.map_err(|_| Unavailable)?;
            match handle.dispatch(request_clone(&request)).await {
                Ok(response) => return Ok(response),
                Err(Unavailable) if attempt == 0 => {
                    self.handles.remove(zone_id);
                }
                Err(Unavailable) => return Err(Unavailable),
            }
        }
        Err(Unavailable)
    }

    async fn lookup_or_spawn(&self, zone_id: &ZoneId) -> Result<ValidatorHandle, liquidity_store::StoreError> {
        if let Some(handle) = self.handles.get(zone_id) {
            return Ok(handle.value().clone());
        }
        let _spawn_guard = self.spawn_lock.lock().await;
        if let Some(handle) = self.handles.get(zone_id) {
            return Ok(handle.value().clone());
        }
        let (handle, join_handle) =
            liquidity_zone::validator::spawn(zone_id.clone(), self.journal.clone(), self.status_topic.clone())
                .await?;
        self.handles.insert(zone_id.clone(), handle.clone());
        let handles = self.handles.clone();
        let passivated_zone = zone_id.clone();
        tokio::spawn(async move {
            let _ = join_handle.await;
            handles.remove(&passivated_zone);
        });
        Ok(handle)
    }

    pub fn active_zone_count(&self) -> usize {
        self.handles.len()
    }
}

// `CommandRequest` carries a `oneshot`-unfriendly `Option<Outbox>` mpsc
// sender, which is `Clone`, so a retry after a passivation race can simply
// reconstruct an equivalent request rather than needing `Clone` on the
// whole struct (its `ZoneCommand` isn't `Copy`-cheap to duplicate blindly
// either way).
fn request_clone(request: &CommandRequest) -> CommandRequest {
    CommandRequest {
        client_id: request.client_id,
        remote_address: request.remote_address.clone(),
        public_key: request.public_key.clone(),
        correlation_id: request.correlation_id,
        command: request.command.clone(),
        outbox: request.outbox.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquidity_crypto::testing::TestIdentity;
    use liquidity_store::InMemoryJournal;
    use liquidity_types::{events::ClientId, RawPublicKey, ZoneCommand, ZoneResponse};
    use liquidity_zone::status::BroadcastStatusTopic;
    use uuid::Uuid;

    fn router() -> ShardedZoneRouter {
        ShardedZoneRouter::new(
            Arc::new(InMemoryJournal::new()),
            Arc::new(BroadcastStatusTopic::default()),
        )
    }

    #[tokio::test]
    async fn spawns_a_validator_on_first_dispatch_and_reuses_it() {
        let router = router();
        let zone_id = ZoneId::new();
        let dave = TestIdentity::generate();
        let request = CommandRequest {
            client_id: ClientId::new(),
            remote_address: None,
            public_key: dave.public_key().clone(),
            correlation_id: Uuid::new_v4(),
            command: ZoneCommand::CreateZone {
                equity_owner_public_key: RawPublicKey(dave.public_key().as_der().to_vec()),
                equity_owner_name: None,
                equity_owner_metadata: None,
                name: None,
                metadata: None,
            },
            outbox: None,
        };
        let response = router.dispatch(&zone_id, request).await.unwrap();
        assert!(matches!(response.zone_response, ZoneResponse::CreateZone(_)));
        assert_eq!(router.active_zone_count(), 1);
    }
}
