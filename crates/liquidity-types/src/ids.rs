//! Identifiers.
//!
//! `MemberId`/`AccountId`/`TransactionId` are the decimal-string form
//! described in invariant 6 of the data model: the validator assigns them as
//! the current size of the owning map at insertion time, and they're
//! compared/displayed as strings on the wire, but ordering (e.g. resolving
//! `AccountUpdatedEvent` with no acting member to the lowest-id owner) needs
//! the numeric value, so each id also exposes `as_index`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub Uuid);

impl ZoneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn persistence_id(&self) -> String {
        format!("zone-{}", self.0)
    }
}

impl Default for ZoneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! decimal_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Construct the id assigned to the `index`-th insertion into a
            /// zone's member/account map (invariant 6).
            pub fn from_index(index: usize) -> Self {
                Self(index.to_string())
            }

            /// Parse the id back to its numeric index, for the rare cases
            /// (legacy `AccountUpdated` fallback) that need a deterministic
            /// ordering over ids rather than lexical string order.
            pub fn as_index(&self) -> Option<u64> {
                self.0.parse().ok()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

decimal_id!(MemberId);
decimal_id!(AccountId);
decimal_id!(TransactionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_id_round_trips_index() {
        let id = AccountId::from_index(7);
        assert_eq!(id.0, "7");
        assert_eq!(id.as_index(), Some(7));
    }
}
