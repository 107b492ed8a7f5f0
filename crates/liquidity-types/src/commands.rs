//! Zone commands (§4.1).
//!
//! Public keys and full Member/Account payloads travel as *unvalidated*
//! wire shapes here - parsing them into `liquidity_crypto::PublicKeyDer` /
//! `domain::Member` / `domain::Account` is the Validation Suite's job
//! (`InvalidPublicKey`, `InvalidPublicKeyType`, `InvalidPublicKeyLength`),
//! not this crate's.

use crate::ids::{AccountId, MemberId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw SubjectPublicKeyInfo DER bytes as received on the wire, base64-coded.
/// Unlike `liquidity_crypto::PublicKeyDer`, constructing one never checks
/// RSA-ness or modulus size - that check belongs to the Validation Suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPublicKey(#[serde(with = "base64_bytes")] pub Vec<u8>);

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(serde::de::Error::custom)
    }
}

/// A caller-supplied member payload, prior to key/length validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberInput {
    pub owner_public_keys: Vec<RawPublicKey>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// A caller-supplied account payload, prior to validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInput {
    pub owner_member_ids: Vec<MemberId>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "data")]
pub enum ZoneCommand {
    CreateZone {
        equity_owner_public_key: RawPublicKey,
        equity_owner_name: Option<String>,
        equity_owner_metadata: Option<serde_json::Value>,
        name: Option<String>,
        metadata: Option<serde_json::Value>,
    },
    JoinZone,
    QuitZone,
    ChangeZoneName {
        name: Option<String>,
    },
    CreateMember(MemberInput),
    UpdateMember {
        id: MemberId,
        update: MemberInput,
    },
    CreateAccount(AccountInput),
    UpdateAccount {
        acting_as: MemberId,
        id: AccountId,
        update: AccountInput,
    },
    AddTransaction {
        acting_as: MemberId,
        from: AccountId,
        to: AccountId,
        value: Decimal,
        description: Option<String>,
        metadata: Option<serde_json::Value>,
    },
}
