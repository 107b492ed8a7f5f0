//! Core entities (§3 of the spec).

use crate::ids::{AccountId, MemberId, TransactionId, ZoneId};
use crate::ts;
use chrono::{DateTime, Utc};
use liquidity_crypto::PublicKeyDer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use indexmap::IndexMap;

/// A member: one or more owning public keys, plus an optional display name
/// and metadata blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub owner_public_keys: BTreeSet<PublicKeyDer>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// An account: one or more owning members, plus optional display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owner_member_ids: BTreeSet<MemberId>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// A recorded transfer from one account to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub from: AccountId,
    pub to: AccountId,
    pub value: Decimal,
    pub creator: MemberId,
    #[serde(with = "ts")]
    pub created: DateTime<Utc>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// A zone: the self-contained ledger of members, accounts and transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub equity_account_id: AccountId,
    pub members: IndexMap<MemberId, Member>,
    pub accounts: IndexMap<AccountId, Account>,
    pub transactions: IndexMap<TransactionId, Transaction>,
    #[serde(with = "ts")]
    pub created: DateTime<Utc>,
    #[serde(with = "ts")]
    pub expires: DateTime<Utc>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl Zone {
    pub fn next_member_id(&self) -> MemberId {
        MemberId::from_index(self.members.len())
    }

    pub fn next_account_id(&self) -> AccountId {
        AccountId::from_index(self.accounts.len())
    }

    pub fn next_transaction_id(&self) -> TransactionId {
        TransactionId::from_index(self.transactions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_serializes_round_trip() {
        let zone = Zone {
            id: ZoneId::new(),
            equity_account_id: AccountId::from_index(0),
            members: IndexMap::new(),
            accounts: IndexMap::new(),
            transactions: IndexMap::new(),
            created: Utc::now(),
            expires: Utc::now(),
            name: Some("Dave's Game".to_string()),
            metadata: None,
        };
        let json = serde_json::to_string(&zone).unwrap();
        let back: Zone = serde_json::from_str(&json).unwrap();
        assert_eq!(zone, back);
    }
}
