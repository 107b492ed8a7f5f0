//! The Zone Validator task: the single-writer owner of one zone's state
//! (§2, §5). Wires together the Command Handler, Event Applier, Client
//! Registry, Passivation Timer and Status Publisher behind one mailbox.
//!
//! Per §9 "Actor model -> single-writer task", this is a plain `tokio` task
//! with an `mpsc` inbox rather than an actor-framework actor; the
//! persistence callback's cyclic back-reference to the actor is avoided by
//! having the journal's `append` simply be `.await`ed in the task's own
//! turn, with every further effect (respond, notify, publish) queued as an
//! outbound message from that same turn - there is no second callback
//! holding a handle back into the validator.

use crate::apply::apply;
use crate::handler::{self, Decision};
use crate::passivation::{self, PassivationHandle};
use crate::registry::{ClientRegistry, Outbox};
use crate::status::{ActiveZoneSummary, StatusTopic};
use chrono::Utc;
use liquidity_crypto::PublicKeyDer;
use liquidity_store::EventJournal;
use liquidity_types::{
    events::ClientId, ZoneCommand, ZoneEventEnvelope, ZoneId, ZoneResponse, ZoneResponseEnvelope,
    ZoneState, PASSIVATION_TIMEOUT, STATUS_PUBLISH_INTERVAL,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// One inbound command, addressed to this validator by the gateway (via the
/// Sharding Router).
pub struct CommandRequest {
    pub client_id: ClientId,
    pub remote_address: Option<String>,
    pub public_key: PublicKeyDer,
    pub correlation_id: Uuid,
    pub command: ZoneCommand,
    /// Present only for `JoinZone`: the channel this client's notifications
    /// should be delivered on for the lifetime of the connection.
    pub outbox: Option<Outbox>,
}

enum Inbound {
    Command {
        request: CommandRequest,
        reply: oneshot::Sender<ZoneResponseEnvelope>,
    },
    ClientDisconnected(ClientId),
    Timeout,
}

/// A lightweight, cloneable reference to a running validator task.
#[derive(Clone)]
pub struct ValidatorHandle {
    zone_id: ZoneId,
    tx: mpsc::Sender<Inbound>,
}

/// The validator's mailbox was closed - the zone has passivated or crashed.
/// Per §5/§7, the caller should retry against a freshly looked-up instance;
/// commands are safe to redeliver (§4.1 step 2).
#[derive(Debug, thiserror::Error)]
#[error("zone validator unavailable")]
pub struct Unavailable;

impl ValidatorHandle {
    pub fn zone_id(&self) -> &ZoneId {
        &self.zone_id
    }

    /// Dispatch one command and await its response.
    pub async fn dispatch(&self, request: CommandRequest) -> Result<ZoneResponseEnvelope, Unavailable> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Inbound::Command {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Unavailable)?;
        reply_rx.await.map_err(|_| Unavailable)
    }
}

struct Validator {
    zone_id: ZoneId,
    persistence_id: String,
    state: ZoneState,
    journal: Arc<dyn EventJournal>,
    status_topic: Arc<dyn StatusTopic>,
    registry: ClientRegistry,
    passivation: PassivationHandle,
    mailbox: mpsc::Receiver<Inbound>,
    self_tx: mpsc::Sender<Inbound>,
}

/// Replay the journal and spawn a validator task for `zone_id`. Returns a
/// handle for dispatching commands and a join handle that resolves once the
/// validator passivates.
pub async fn spawn(
    zone_id: ZoneId,
    journal: Arc<dyn EventJournal>,
    status_topic: Arc<dyn StatusTopic>,
) -> Result<(ValidatorHandle, tokio::task::JoinHandle<()>), liquidity_store::StoreError> {
    let persistence_id = zone_id.persistence_id();
    let persisted = journal.replay(&persistence_id).await?;
    let mut state = ZoneState::empty();
    for record in &persisted {
        apply(&mut state, &record.envelope);
    }

    let (tx, rx) = mpsc::channel(64);
    let self_tx = tx.clone();
    let timeout_tx = tx.clone();
    let passivation = passivation::spawn(PASSIVATION_TIMEOUT, move || {
        let _ = timeout_tx.try_send(Inbound::Timeout);
    });

    let validator = Validator {
        zone_id: zone_id.clone(),
        persistence_id,
        state,
        journal,
        status_topic,
        registry: ClientRegistry::new(),
        passivation,
        mailbox: rx,
        self_tx,
    };

    let join_handle = tokio::spawn(validator.run());
    Ok((ValidatorHandle { zone_id, tx }, join_handle))
}

impl Validator {
    async fn run(mut self) {
        let mut status_interval = tokio::time::interval(STATUS_PUBLISH_INTERVAL);
        status_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                inbound = self.mailbox.recv() => {
                    match inbound {
                        Some(Inbound::Command { request, reply }) => {
                            self.handle_command(request, reply).await;
                        }
                        Some(Inbound::ClientDisconnected(client_id)) => {
                            self.handle_disconnect(client_id).await;
                        }
                        Some(Inbound::Timeout) => {
                            tracing::info!(zone_id = %self.zone_id, "passivating idle zone");
                            break;
                        }
                        None => break,
                    }
                }
                _ = status_interval.tick() => {
                    self.publish_status().await;
                }
            }
        }
    }

    async fn handle_command(&mut self, request: CommandRequest, reply: oneshot::Sender<ZoneResponseEnvelope>) {
        self.passivation.command_received().await;

        let decision = handler::decide(
            &self.state,
            &self.zone_id,
            request.client_id,
            &request.public_key,
            &request.command,
        );

        let response = match decision {
            Decision::Reject(errors) => ZoneResponse::failure(errors),
            Decision::NoOp(response) => response,
            Decision::Persist {
                event,
                response,
                notification,
            } => {
                let envelope = ZoneEventEnvelope {
                    remote_address: request.remote_address.clone(),
                    public_key: Some(request.public_key.clone()),
                    timestamp: Utc::now(),
                    zone_event: event,
                };
                match self.journal.append(&self.persistence_id, envelope).await {
                    Ok(persisted) => {
                        let was_connected = !self.registry.is_empty();
                        apply(&mut self.state, &persisted.envelope);
                        self.sync_registry(&persisted.envelope, request.client_id, request.outbox.clone())
                            .await;
                        let is_connected = !self.registry.is_empty();
                        if !was_connected && is_connected {
                            self.passivation.stop().await;
                        } else if was_connected && !is_connected {
                            self.passivation.start().await;
                        }

                        // (b) refresh status publication as soon as
                        // anything about this zone changes, not just on the
                        // 30s tick (§4.1 step 3).
                        self.publish_status().await;

                        // The caller's response must precede any notification
                        // of this event reaching another client (§5 ordering
                        // guarantee 3, §8 "Response/notification ordering"),
                        // so send it before broadcasting.
                        let _ = reply.send(ZoneResponseEnvelope {
                            correlation_id: request.correlation_id,
                            zone_id: self.zone_id.clone(),
                            zone_response: response,
                        });

                        if let Some(notification) = notification {
                            self.registry
                                .broadcast(&self.zone_id, &request.public_key, &notification)
                                .await;
                        }
                        return;
                    }
                    Err(error) => {
                        // §7 stratum 2: persistence failure. The event was
                        // either committed or not; we cannot tell which from
                        // here, so the safest move is to stop - a fresh
                        // instance will replay the journal and the caller's
                        // redelivered command is idempotent either way.
                        tracing::error!(zone_id = %self.zone_id, %error, "journal append failed, passivating");
                        drop(reply);
                        return;
                    }
                }
            }
        };

        let _ = reply.send(ZoneResponseEnvelope {
            correlation_id: request.correlation_id,
            zone_id: self.zone_id.clone(),
            zone_response: response,
        });
    }

    /// Bring the Client Registry (outboxes, sequence numbers, disconnect
    /// watches) in line with whatever `ClientJoined`/`ClientQuit` event was
    /// just folded into `ZoneState`.
    async fn sync_registry(
        &mut self,
        envelope: &ZoneEventEnvelope,
        client_id: ClientId,
        outbox: Option<Outbox>,
    ) {
        match &envelope.zone_event {
            liquidity_types::ZoneEvent::ClientJoined { client_id: joined } => {
                if let Some(outbox) = outbox {
                    self.registry.join(*joined, outbox);
                    let tx = self.self_tx.clone();
                    self.registry.watch(*joined, move |id| async move {
                        let _ = tx.send(Inbound::ClientDisconnected(id)).await;
                    });
                }
            }
            liquidity_types::ZoneEvent::ClientQuit { client_id: quit } => {
                self.registry.remove(*quit);
            }
            _ => {}
        }
        let _ = client_id;
    }

    /// A connected client's outbox closed without an explicit `QuitZone` -
    /// persist the `ClientQuit` the Event Applier would otherwise never see
    /// (§3 "Ownership": "loss of liveness emits a ClientQuitEvent").
    async fn handle_disconnect(&mut self, client_id: ClientId) {
        let public_key = match self.state.connected_clients.get(&client_id) {
            Some(key) => key.clone(),
            None => return, // already removed (e.g. explicit QuitZone raced us)
        };
        let envelope = ZoneEventEnvelope {
            remote_address: None,
            public_key: Some(public_key.clone()),
            timestamp: Utc::now(),
            zone_event: liquidity_types::ZoneEvent::ClientQuit { client_id },
        };
        let persisted = match self.journal.append(&self.persistence_id, envelope).await {
            Ok(persisted) => persisted,
            Err(error) => {
                tracing::error!(zone_id = %self.zone_id, %error, "failed to persist observed disconnect");
                return;
            }
        };
        let was_connected = !self.registry.is_empty();
        apply(&mut self.state, &persisted.envelope);
        self.registry.remove(client_id);
        if was_connected && self.registry.is_empty() {
            self.passivation.start().await;
        }
        self.publish_status().await;
        self.registry
            .broadcast(
                &self.zone_id,
                &public_key,
                &liquidity_types::ZoneNotification::ClientQuit {
                    client_id,
                    public_key,
                },
            )
            .await;
    }

    async fn publish_status(&self) {
        let Some(zone) = &self.state.zone else {
            return;
        };
        let summary = ActiveZoneSummary {
            zone_id: self.zone_id.clone(),
            members: zone.members.clone(),
            accounts: zone.accounts.clone(),
            transactions: zone.transactions.clone(),
            metadata: zone.metadata.clone(),
            connected_client_keys: self.state.connected_clients.values().cloned().collect(),
        };
        self.status_topic.publish(summary).await;
    }
}
