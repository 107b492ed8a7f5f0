//! Zone notifications (§4.4): fanned out to connected clients in insertion
//! order, one per accepted event that has a client-visible effect.

use crate::domain::{Account, Member, Transaction};
use crate::events::ClientId;
use crate::ids::MemberId;
use liquidity_crypto::PublicKeyDer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "notification", content = "data")]
pub enum ZoneNotification {
    ClientJoined {
        client_id: ClientId,
        public_key: PublicKeyDer,
    },
    ClientQuit {
        client_id: ClientId,
        public_key: PublicKeyDer,
    },
    ZoneNameChanged {
        name: Option<String>,
    },
    MemberCreated {
        member: Member,
    },
    MemberUpdated {
        member: Member,
    },
    AccountCreated {
        account: Account,
    },
    /// Carries the resolved `actingAs` member - already defaulted to the
    /// account's lowest-id owner for legacy events with none (§9).
    AccountUpdated {
        acting_as: MemberId,
        account: Account,
    },
    TransactionAdded {
        transaction: Transaction,
    },
}
