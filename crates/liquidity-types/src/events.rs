//! Zone events (§4.1, §4.3). One variant persisted per accepted command.

use crate::domain::{Account, Member, Transaction, Zone};
use crate::ids::MemberId;
use serde::{Deserialize, Serialize};

/// A client connection, identified for the lifetime of the notification
/// stream it attaches to. Opaque beyond equality/display - the registry
/// never inspects it further than that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub uuid::Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ZoneEvent {
    ZoneCreated {
        zone: Zone,
    },
    ClientJoined {
        client_id: ClientId,
    },
    ClientQuit {
        client_id: ClientId,
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
    /// `acting_as` is `None` only for envelopes written before this field
    /// existed; the Event Applier and notification path both tolerate it
    /// (§9 Open Questions).
    AccountUpdated {
        acting_as: Option<MemberId>,
        account: Account,
    },
    TransactionAdded {
        transaction: Transaction,
    },
}
