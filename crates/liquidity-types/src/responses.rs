//! Zone command responses (§4.1). A rejected command yields `Failure` with
//! the non-empty error list produced by the Validation Suite.

use crate::domain::{Account, Member, Transaction, Zone};
use crate::error::ErrorCode;
use crate::events::ClientId;
use liquidity_crypto::PublicKeyDer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response", content = "data")]
pub enum ZoneResponse {
    CreateZone(Zone),
    JoinZone {
        zone: Zone,
        connected_clients: BTreeMap<ClientId, PublicKeyDer>,
    },
    QuitZone,
    ChangeZoneName,
    CreateMember(Member),
    UpdateMember,
    CreateAccount(Account),
    UpdateAccount,
    AddTransaction(Transaction),
    /// A command rejected by the Validation Suite. Never empty - see
    /// [`ErrorCode`].
    Failure(Vec<ErrorCode>),
}

impl ZoneResponse {
    pub fn failure(errors: Vec<ErrorCode>) -> Self {
        debug_assert!(!errors.is_empty(), "failure response must carry at least one error");
        Self::Failure(errors)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}
