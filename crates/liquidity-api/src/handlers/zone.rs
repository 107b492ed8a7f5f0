//! `PUT /zone` and `PUT /zone/{id}` (§6): the two client-facing command
//! endpoints. Both decode a [`ZoneCommand`], stamp it with the caller's
//! verified identity and remote address, and forward it to the zone's
//! validator through the Sharding Router; the validator's
//! [`ZoneResponseEnvelope`] is returned to the caller verbatim.
//!
//! `PUT /zone` additionally mints a fresh [`ZoneId`] for the caller - the
//! spec's [`ZoneCommand::CreateZone`] carries no zone id of its own, since
//! assigning one is this gateway's job, not the validator's.

use axum::extract::{ConnectInfo, Path, State};
use axum::Json;
use liquidity_types::{ClientId, ZoneCommand, ZoneId, ZoneResponseEnvelope};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extractors::Authenticated;
use crate::state::AppState;

async fn dispatch(
    state: &AppState,
    zone_id: ZoneId,
    remote_address: Option<SocketAddr>,
    public_key: liquidity_crypto::PublicKeyDer,
    command: ZoneCommand,
) -> Result<ZoneResponseEnvelope, ApiError> {
    let request = liquidity_zone::CommandRequest {
        client_id: ClientId::new(),
        remote_address: remote_address.map(|addr| addr.to_string()),
        public_key,
        correlation_id: Uuid::new_v4(),
        command,
        outbox: None,
    };
    Ok(state.router.dispatch(&zone_id, request).await?)
}

/// `PUT /zone`: create a new zone, identified by a gateway-assigned id.
pub async fn create_zone(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote_address): ConnectInfo<SocketAddr>,
    Authenticated(public_key): Authenticated,
    Json(command): Json<ZoneCommand>,
) -> Result<Json<ZoneResponseEnvelope>, ApiError> {
    if !matches!(command, ZoneCommand::CreateZone { .. }) {
        return Err(ApiError::bad_request("PUT /zone only accepts CreateZone"));
    }
    let zone_id = ZoneId::new();
    let response = dispatch(&state, zone_id, Some(remote_address), public_key, command).await?;
    Ok(Json(response))
}

/// `PUT /zone/{id}`: every other command, addressed to an existing (or,
/// for a redelivered `CreateZone`, not-yet-existing) zone.
pub async fn send_command(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<Uuid>,
    ConnectInfo(remote_address): ConnectInfo<SocketAddr>,
    Authenticated(public_key): Authenticated,
    Json(command): Json<ZoneCommand>,
) -> Result<Json<ZoneResponseEnvelope>, ApiError> {
    let response = dispatch(
        &state,
        ZoneId(zone_id),
        Some(remote_address),
        public_key,
        command,
    )
    .await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_state;
    use liquidity_crypto::testing::TestIdentity;
    use liquidity_types::RawPublicKey;

    #[tokio::test]
    async fn create_zone_assigns_a_fresh_id_and_returns_the_zone() {
        let state = test_state();
        let dave = TestIdentity::generate();
        let command = ZoneCommand::CreateZone {
            equity_owner_public_key: RawPublicKey(dave.public_key().as_der().to_vec()),
            equity_owner_name: Some("Dave".to_string()),
            equity_owner_metadata: None,
            name: Some("Dave's Game".to_string()),
            metadata: None,
        };
        let response = dispatch(
            &state,
            ZoneId::new(),
            None,
            dave.public_key().clone(),
            command,
        )
        .await
        .expect("create zone should succeed");
        match response.zone_response {
            liquidity_types::ZoneResponse::CreateZone(zone) => {
                assert_eq!(zone.name, Some("Dave's Game".to_string()));
            }
            other => panic!("expected CreateZone response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorised_member_update_surfaces_as_a_failure_response_not_an_http_error() {
        let state = test_state();
        let dave = TestIdentity::generate();
        let impostor = TestIdentity::generate();
        let zone_id = ZoneId::new();
        dispatch(
            &state,
            zone_id.clone(),
            None,
            dave.public_key().clone(),
            ZoneCommand::CreateZone {
                equity_owner_public_key: RawPublicKey(dave.public_key().as_der().to_vec()),
                equity_owner_name: None,
                equity_owner_metadata: None,
                name: None,
                metadata: None,
            },
        )
        .await
        .unwrap();

        let response = dispatch(
            &state,
            zone_id,
            None,
            impostor.public_key().clone(),
            ZoneCommand::UpdateMember {
                id: liquidity_types::MemberId::from_index(0),
                update: liquidity_types::MemberInput {
                    owner_public_keys: vec![],
                    name: Some("Dave".to_string()),
                    metadata: None,
                },
            },
        )
        .await
        .expect("a rejected command is still an HTTP success");
        assert!(response.zone_response.is_failure());
    }
}
