//! `GET /zone/{id}` (§6, §4.4): the notification stream. A websocket
//! connection *is* the client's liveness signal for §3's "Ownership" rule -
//! there is no separate heartbeat, so losing the socket is what eventually
//! produces an observed `ClientQuit` (via the validator's registry watch).
//!
//! A raw websocket upgrade has no Authorization header to extract a bearer
//! token from (the browser `WebSocket` constructor can't set one), so the
//! caller's token travels as the `?token=` query parameter instead - the same
//! token the other endpoints carry as a bearer.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use liquidity_types::{events::ClientId, ZoneCommand, ZoneId};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    token: String,
}

/// `GET /zone/{id}`: upgrade to a websocket, join the zone, and stream
/// [`liquidity_types::ZoneNotificationEnvelope`]s until the socket closes.
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<Uuid>,
    Query(query): Query<ConnectQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let public_key = state.verifier.verify(&query.token)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(state, ZoneId(zone_id), public_key, socket)))
}

async fn handle_socket(
    state: Arc<AppState>,
    zone_id: ZoneId,
    public_key: liquidity_crypto::PublicKeyDer,
    socket: WebSocket,
) {
    let client_id = ClientId::new();
    let (mut sender, mut receiver) = socket.split();
    let (outbox_tx, mut outbox_rx) = tokio::sync::mpsc::channel(64);

    let request = liquidity_zone::CommandRequest {
        client_id,
        remote_address: None,
        public_key: public_key.clone(),
        correlation_id: Uuid::new_v4(),
        command: ZoneCommand::JoinZone,
        outbox: Some(outbox_tx),
    };

    let join_response = match state.router.dispatch(&zone_id, request).await {
        Ok(response) => response,
        Err(_) => {
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    if join_response.zone_response.is_failure() {
        let body = serde_json::to_string(&join_response).unwrap_or_default();
        let _ = sender.send(Message::Text(body)).await;
        let _ = sender.send(Message::Close(None)).await;
        return;
    }

    // Forward the validator's notifications to the socket until either side
    // closes. The inbound half only exists to detect the client going away -
    // §4.4 carries no command protocol over this socket, it is
    // notification-only.
    let forward = async {
        while let Some(envelope) = outbox_rx.recv().await {
            let body = match serde_json::to_string(&envelope) {
                Ok(body) => body,
                Err(error) => {
                    tracing::error!(%error, "failed to encode zone notification");
                    continue;
                }
            };
            if sender.send(Message::Text(body)).await.is_err() {
                break;
            }
        }
    };

    let detect_close = async {
        loop {
            match receiver.next().await {
                Some(Ok(_)) => continue,
                _ => break,
            }
        }
    };

    tokio::select! {
        _ = forward => {}
        _ = detect_close => {}
    }

    // `outbox_tx` drops with this task; the registry's `watch` (§4.4) is
    // what turns that closed channel into a persisted `ClientQuit`.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_state;
    use liquidity_crypto::testing::TestIdentity;
    use liquidity_types::{ClientId, RawPublicKey, ZoneResponse};

    #[tokio::test]
    async fn join_zone_returns_the_current_zone_state_to_the_joining_client() {
        let state = test_state();
        let dave = TestIdentity::generate();
        let zone_id = ZoneId::new();

        state
            .router
            .dispatch(
                &zone_id,
                liquidity_zone::CommandRequest {
                    client_id: ClientId::new(),
                    remote_address: None,
                    public_key: dave.public_key().clone(),
                    correlation_id: Uuid::new_v4(),
                    command: ZoneCommand::CreateZone {
                        equity_owner_public_key: RawPublicKey(dave.public_key().as_der().to_vec()),
                        equity_owner_name: None,
                        equity_owner_metadata: None,
                        name: None,
                        metadata: None,
                    },
                    outbox: None,
                },
            )
            .await
            .expect("create zone should succeed");

        let (outbox_tx, _outbox_rx) = tokio::sync::mpsc::channel(8);
        let response = state
            .router
            .dispatch(
                &zone_id,
                liquidity_zone::CommandRequest {
                    client_id: ClientId::new(),
                    remote_address: None,
                    public_key: dave.public_key().clone(),
                    correlation_id: Uuid::new_v4(),
                    command: ZoneCommand::JoinZone,
                    outbox: Some(outbox_tx),
                },
            )
            .await
            .expect("join zone should succeed");

        assert!(matches!(response.zone_response, ZoneResponse::JoinZone { .. }));
    }
}
