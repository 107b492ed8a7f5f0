//! In-memory zone state (§3). Reconstructed by folding persisted events
//! through the Event Applier; never itself persisted.

use crate::domain::Zone;
use crate::events::ClientId;
use crate::ids::AccountId;
use indexmap::IndexMap;
use liquidity_crypto::PublicKeyDer;
use rust_decimal::Decimal;

/// The validator's live state for one zone. `None` zone means the zone has
/// never been created (invariant 1: `balances`/`connected_clients` are then
/// empty too).
#[derive(Debug, Clone, Default)]
pub struct ZoneState {
    pub zone: Option<Zone>,
    pub balances: IndexMap<AccountId, Decimal>,
    pub connected_clients: IndexMap<ClientId, PublicKeyDer>,
}

impl ZoneState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.zone.is_none()
    }
}
