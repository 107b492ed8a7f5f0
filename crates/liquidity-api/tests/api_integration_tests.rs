//! End-to-end HTTP tests against the real router and an in-memory journal,
//! covering the gateway scenarios walked through in spec §8: create a zone,
//! rename it, transfer between accounts, reject an overdraw, and reject a
//! reflexive transaction - all driven purely through `PUT /zone*` requests,
//! never by calling the domain crates directly.

use axum::body::Body;
use axum::extract::connect_info::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use liquidity_api::state::testing::test_state;
use liquidity_api::create_router;
use liquidity_auth::testing::mint_self_signed;
use liquidity_crypto::testing::TestIdentity;
use liquidity_types::RawPublicKey;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tower::ServiceExt;

fn router() -> Router {
    create_router(test_state())
}

fn addr() -> SocketAddr {
    "127.0.0.1:9999".parse().unwrap()
}

async fn put(router: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(addr()));
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn token(identity: &TestIdentity) -> String {
    mint_self_signed(identity, Duration::from_secs(60))
}

fn public_key_json(identity: &TestIdentity) -> Value {
    serde_json::to_value(RawPublicKey(identity.public_key().as_der().to_vec())).unwrap()
}

#[tokio::test]
async fn creates_a_zone_and_returns_its_equity_member_and_account() {
    let router = router();
    let dave = TestIdentity::generate();
    let (status, body) = put(
        &router,
        "/zone",
        &token(&dave),
        json!({
            "command": "CreateZone",
            "data": {
                "equity_owner_public_key": public_key_json(&dave),
                "equity_owner_name": "Dave",
                "equity_owner_metadata": null,
                "name": "Dave's Game",
                "metadata": null,
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zone_response"]["response"], "CreateZone");
    assert_eq!(body["zone_response"]["data"]["name"], "Dave's Game");
}

#[tokio::test]
async fn full_walkthrough_rename_transfer_overdraw_and_reflexive_rejection() {
    let router = router();
    let dave = TestIdentity::generate();
    let dave_token = token(&dave);

    let (status, created) = put(
        &router,
        "/zone",
        &dave_token,
        json!({
            "command": "CreateZone",
            "data": {
                "equity_owner_public_key": public_key_json(&dave),
                "equity_owner_name": "Dave",
                "equity_owner_metadata": null,
                "name": null,
                "metadata": null,
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let zone = &created["zone_response"]["data"];
    let zone_id = created["zone_id"].as_str().unwrap().to_string();
    let equity_account_id = zone["accounts"]
        .as_object()
        .unwrap()
        .keys()
        .next()
        .unwrap()
        .clone();
    let dave_member_id = zone["members"]
        .as_object()
        .unwrap()
        .keys()
        .next()
        .unwrap()
        .clone();

    // Rename the zone.
    let (status, renamed) = put(
        &router,
        &format!("/zone/{zone_id}"),
        &dave_token,
        json!({ "command": "ChangeZoneName", "data": { "name": "Renamed Game" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["zone_response"]["response"], "ChangeZoneName");

    // Add a second member owned by a new identity, and a non-equity account
    // for them.
    let carol = TestIdentity::generate();
    let (status, member) = put(
        &router,
        &format!("/zone/{zone_id}"),
        &dave_token,
        json!({
            "command": "CreateMember",
            "data": {
                "owner_public_keys": [public_key_json(&carol)],
                "name": "Carol",
                "metadata": null,
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let carol_member_id = member["zone_response"]["data"]["id"].clone();

    let (status, account) = put(
        &router,
        &format!("/zone/{zone_id}"),
        &dave_token,
        json!({
            "command": "CreateAccount",
            "data": {
                "owner_member_ids": [carol_member_id],
                "name": "Carol's Wallet",
                "metadata": null,
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let carol_account_id = account["zone_response"]["data"]["id"].as_str().unwrap().to_string();

    // Transfer from the (unbounded) equity account to Carol's account, acted
    // by Dave (the equity account's owner).
    let (status, transfer) = put(
        &router,
        &format!("/zone/{zone_id}"),
        &dave_token,
        json!({
            "command": "AddTransaction",
            "data": {
                "acting_as": dave_member_id,
                "from": equity_account_id,
                "to": carol_account_id,
                "value": "100.00",
                "description": "initial stake",
                "metadata": null,
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "transfer response: {transfer:?}");
    assert_eq!(transfer["zone_response"]["response"], "AddTransaction");

    // Overdrawing Carol's now-bounded account must be rejected - signed by
    // Carol, acting as herself.
    let carol_token = token(&carol);
    let (status, overdraw) = put(
        &router,
        &format!("/zone/{zone_id}"),
        &carol_token,
        json!({
            "command": "AddTransaction",
            "data": {
                "acting_as": carol_member_id,
                "from": carol_account_id,
                "to": equity_account_id,
                "value": "1000.00",
                "description": null,
                "metadata": null,
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "a rejected command is still an HTTP 200");
    assert_eq!(overdraw["zone_response"]["response"], "Failure");
    let codes: Vec<String> = overdraw["zone_response"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["code"].as_str().unwrap_or_default().to_string())
        .collect();
    assert!(codes.contains(&"InsufficientBalance".to_string()), "{codes:?}");

    // A reflexive transaction (from == to) is always rejected.
    let (status, reflexive) = put(
        &router,
        &format!("/zone/{zone_id}"),
        &carol_token,
        json!({
            "command": "AddTransaction",
            "data": {
                "acting_as": carol_member_id,
                "from": carol_account_id,
                "to": carol_account_id,
                "value": "1.00",
                "description": null,
                "metadata": null,
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reflexive["zone_response"]["response"], "Failure");
}

#[tokio::test]
async fn rejects_commands_without_a_bearer_token() {
    let router = router();
    let request = Request::builder()
        .method("PUT")
        .uri("/zone")
        .header("content-type", "application/json")
        .body(Body::from(json!({"command": "CreateZone"}).to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn operational_endpoints_respond() {
    let router = router();

    let request = Request::builder()
        .uri("/alive")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/version")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn diagnostics_zone_summary_is_not_found_before_any_status_is_published() {
    let router = router();
    let zone_id = uuid::Uuid::new_v4();
    let request = Request::builder()
        .uri(format!("/diagnostics/zone/{zone_id}"))
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
