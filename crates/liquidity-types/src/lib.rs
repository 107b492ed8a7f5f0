//! Domain entities and wire envelopes for the Liquidity zone validator.
//!
//! This crate has no behaviour of its own: it is the shared vocabulary that
//! `liquidity-validation`, `liquidity-zone`, `liquidity-store`,
//! `liquidity-auth` and `liquidity-api` all build on.

pub mod commands;
pub mod constants;
pub mod domain;
pub mod envelopes;
pub mod error;
pub mod events;
pub mod ids;
pub mod notifications;
pub mod responses;
pub mod state;
pub mod ts;

pub use commands::{AccountInput, MemberInput, RawPublicKey, ZoneCommand};
pub use constants::*;
pub use domain::{Account, Member, Transaction, Zone};
pub use envelopes::{
    ZoneCommandEnvelope, ZoneEventEnvelope, ZoneNotificationEnvelope, ZoneResponseEnvelope,
};
pub use error::ErrorCode;
pub use events::{ClientId, ZoneEvent};
pub use ids::{AccountId, MemberId, TransactionId, ZoneId};
pub use notifications::ZoneNotification;
pub use responses::ZoneResponse;
pub use state::ZoneState;
