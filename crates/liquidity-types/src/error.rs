//! The closed `ErrorCode` enumeration (§4.2).
//!
//! Validators never short-circuit sibling checks - a single rejected command
//! can carry more than one of these - so every rejection is a non-empty
//! `Vec<ErrorCode>`, never a lone code.

use crate::ids::{AccountId, MemberId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "code", content = "data")]
pub enum ErrorCode {
    #[error("tag exceeds {0} characters")]
    TagLengthExceeded(usize),
    #[error("metadata exceeds {0} bytes")]
    MetadataLengthExceeded(usize),
    #[error("no public keys supplied")]
    NoPublicKeys,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("public key is not an RSA key")]
    InvalidPublicKeyType,
    #[error("public key modulus is not 2048 bits")]
    InvalidPublicKeyLength,
    #[error("no member ids supplied")]
    NoMemberIds,
    #[error("member {0} does not exist")]
    MemberDoesNotExist(MemberId),
    #[error("account {0} does not exist")]
    AccountDoesNotExist(AccountId),
    #[error("caller's public key does not match the member")]
    MemberKeyMismatch,
    #[error("caller does not own the acting account")]
    AccountOwnerMismatch,
    #[error("source account does not exist")]
    SourceAccountDoesNotExist,
    #[error("destination account does not exist")]
    DestinationAccountDoesNotExist,
    #[error("transaction source and destination are the same account")]
    ReflexiveTransaction,
    #[error("transaction value is negative")]
    NegativeTransactionValue,
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("zone does not exist")]
    ZoneDoesNotExist,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_serializes_with_tag_and_content() {
        let code = ErrorCode::MemberDoesNotExist(MemberId::from_index(3));
        let json = serde_json::to_value(&code).unwrap();
        assert_eq!(json["code"], "MemberDoesNotExist");
        assert_eq!(json["data"], "3");
    }

    #[test]
    fn unit_variant_round_trips() {
        let code = ErrorCode::InsufficientBalance;
        let json = serde_json::to_string(&code).unwrap();
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
