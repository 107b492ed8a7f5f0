//! The Client Registry (§4.4): per-connected-client notification delivery.
//!
//! `ZoneState::connected_clients` (persisted transiently via `ClientJoined`/
//! `ClientQuit` events, but never durable membership - §3 "Lifecycles") is
//! the source of truth for *who* is connected. This module owns the two
//! things that are never persisted: each client's outbound channel, and its
//! next notification sequence number.

use indexmap::IndexMap;
use liquidity_types::{events::ClientId, ZoneId, ZoneNotification, ZoneNotificationEnvelope};
use tokio::sync::mpsc;

/// A connected client's outbound channel. Dropped (e.g. because the
/// gateway's websocket task exited) means disconnected - the registry
/// watches for that via [`ClientRegistry::watch`].
pub type Outbox = mpsc::Sender<ZoneNotificationEnvelope>;

/// Sequence numbers and outboxes for every currently connected client, kept
/// in the same insertion order as `ZoneState::connected_clients` so fan-out
/// order matches (§4.4 "iterates connected_clients in insertion order").
#[derive(Default)]
pub struct ClientRegistry {
    outboxes: IndexMap<ClientId, Outbox>,
    sequence_numbers: IndexMap<ClientId, u64>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly joined client's outbox, starting its notification
    /// sequence at 0.
    pub fn join(&mut self, client_id: ClientId, outbox: Outbox) {
        self.outboxes.insert(client_id, outbox);
        self.sequence_numbers.insert(client_id, 0);
    }

    /// Remove a client on quit or observed disconnect.
    pub fn remove(&mut self, client_id: ClientId) {
        self.outboxes.shift_remove(&client_id);
        self.sequence_numbers.shift_remove(&client_id);
    }

    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    pub fn contains(&self, client_id: ClientId) -> bool {
        self.outboxes.contains_key(&client_id)
    }

    /// Spawn a task that resolves once `client_id`'s outbox is dropped, and
    /// sends `on_disconnect(client_id)` into the validator's own mailbox.
    /// Models the source's `context.watch` on a client's connection actor
    /// (§9 "Actor model -> single-writer task").
    pub fn watch<F, Fut>(&self, client_id: ClientId, on_disconnect: F)
    where
        F: FnOnce(ClientId) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        if let Some(outbox) = self.outboxes.get(&client_id).cloned() {
            tokio::spawn(async move {
                outbox.closed().await;
                on_disconnect(client_id).await;
            });
        }
    }

    /// Send `notification` to every connected client (in insertion order),
    /// stamping each with that client's next sequence number and
    /// incrementing it (§4.4 "strictly monotonically increasing ... no
    /// holes"). Clients whose outbox has already closed are skipped, not
    /// treated as an error - the disconnect watcher (`watch`) is the one
    /// source of truth for removing them from the registry.
    pub async fn broadcast(
        &mut self,
        zone_id: &ZoneId,
        origin: &liquidity_crypto::PublicKeyDer,
        notification: &ZoneNotification,
    ) {
        for (client_id, outbox) in self.outboxes.iter() {
            let sequence_number = self
                .sequence_numbers
                .get(client_id)
                .copied()
                .unwrap_or_default();
            let envelope = ZoneNotificationEnvelope {
                origin: origin.clone(),
                zone_id: zone_id.clone(),
                sequence_number,
                zone_notification: notification.clone(),
            };
            // A full outbox or closed receiver just means this client
            // misses one delivery - it is not this validator's job to
            // retry; the gateway's reconnect path re-subscribes and the
            // diagnostics endpoint can always replay from the journal.
            let _ = outbox.try_send(envelope);
            if let Some(seq) = self.sequence_numbers.get_mut(client_id) {
                *seq += 1;
            }
        }
    }
}
