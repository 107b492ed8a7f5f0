//! Transport/persistence envelopes (§6, GLOSSARY "Envelope").

use crate::commands::ZoneCommand;
use crate::events::ZoneEvent;
use crate::ids::ZoneId;
use crate::notifications::ZoneNotification;
use crate::responses::ZoneResponse;
use crate::ts;
use chrono::{DateTime, Utc};
use liquidity_crypto::PublicKeyDer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A command addressed to a zone, as routed by the Sharding Router to the
/// validator owning `zone_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCommandEnvelope {
    pub remote_address: Option<String>,
    pub public_key: PublicKeyDer,
    pub correlation_id: Uuid,
    pub zone_id: ZoneId,
    pub zone_command: ZoneCommand,
}

/// The reply to a `ZoneCommandEnvelope`, correlated by `correlation_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneResponseEnvelope {
    pub correlation_id: Uuid,
    pub zone_id: ZoneId,
    pub zone_response: ZoneResponse,
}

/// A notification fanned out to one connected client (§4.4). `origin` is the
/// public key of the caller whose command produced the underlying event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneNotificationEnvelope {
    pub origin: PublicKeyDer,
    pub zone_id: ZoneId,
    pub sequence_number: u64,
    pub zone_notification: ZoneNotification,
}

/// The persisted record (§3, §6): one per accepted event, keyed in the
/// journal by `persistence_id = "zone-" + zone_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEventEnvelope {
    pub remote_address: Option<String>,
    pub public_key: Option<PublicKeyDer>,
    #[serde(with = "ts")]
    pub timestamp: DateTime<Utc>,
    pub zone_event: ZoneEvent,
}
