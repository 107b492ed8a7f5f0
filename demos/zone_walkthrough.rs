//! Zone walkthrough
//!
//! A runnable, in-memory replay of spec §8's scenarios: create a zone, add a
//! member and account, transfer between them, and observe the validator
//! reject an overdraw and a reflexive transaction. No network, no Postgres -
//! everything here is driven straight through `liquidity-router`'s
//! `ShardedZoneRouter` over an `InMemoryJournal`, the same shape the crate's
//! own integration tests use.
//!
//! ```bash
//! cargo run --bin zone-walkthrough
//! ```

use liquidity_crypto::testing::TestIdentity;
use liquidity_router::ShardedZoneRouter;
use liquidity_store::InMemoryJournal;
use liquidity_types::{events::ClientId, MemberId, RawPublicKey, ZoneCommand, ZoneId, ZoneResponse};
use liquidity_zone::status::BroadcastStatusTopic;
use liquidity_zone::CommandRequest;
use std::sync::Arc;
use uuid::Uuid;

async fn send(
    router: &ShardedZoneRouter,
    zone_id: &ZoneId,
    caller: &TestIdentity,
    command: ZoneCommand,
) -> ZoneResponse {
    let request = CommandRequest {
        client_id: ClientId::new(),
        remote_address: None,
        public_key: caller.public_key().clone(),
        correlation_id: Uuid::new_v4(),
        command,
        outbox: None,
    };
    router
        .dispatch(zone_id, request)
        .await
        .expect("validator should be reachable")
        .zone_response
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let journal = Arc::new(InMemoryJournal::new());
    let status_topic = Arc::new(BroadcastStatusTopic::default());
    let router = ShardedZoneRouter::new(journal, status_topic);
    let zone_id = ZoneId::new();

    let dave = TestIdentity::generate();
    let carol = TestIdentity::generate();

    println!("creating zone owned by Dave...");
    let response = send(
        &router,
        &zone_id,
        &dave,
        ZoneCommand::CreateZone {
            equity_owner_public_key: RawPublicKey(dave.public_key().as_der().to_vec()),
            equity_owner_name: Some("Dave".to_string()),
            equity_owner_metadata: None,
            name: Some("Dave's Game".to_string()),
            metadata: None,
        },
    )
    .await;
    let zone = match response {
        ZoneResponse::CreateZone(zone) => zone,
        other => panic!("unexpected response: {other:?}"),
    };
    println!("  zone {} created, equity account {}", zone.id, zone.equity_account_id);

    println!("renaming zone...");
    send(
        &router,
        &zone_id,
        &dave,
        ZoneCommand::ChangeZoneName {
            name: Some("Renamed Game".to_string()),
        },
    )
    .await;

    println!("adding member Carol...");
    let response = send(
        &router,
        &zone_id,
        &dave,
        ZoneCommand::CreateMember(liquidity_types::MemberInput {
            owner_public_keys: vec![RawPublicKey(carol.public_key().as_der().to_vec())],
            name: Some("Carol".to_string()),
            metadata: None,
        }),
    )
    .await;
    let carol_member = match response {
        ZoneResponse::CreateMember(member) => member,
        other => panic!("unexpected response: {other:?}"),
    };

    println!("opening an account for Carol...");
    let response = send(
        &router,
        &zone_id,
        &dave,
        ZoneCommand::CreateAccount(liquidity_types::AccountInput {
            owner_member_ids: vec![carol_member.id.clone()],
            name: Some("Carol's Wallet".to_string()),
            metadata: None,
        }),
    )
    .await;
    let carol_account = match response {
        ZoneResponse::CreateAccount(account) => account,
        other => panic!("unexpected response: {other:?}"),
    };

    let dave_member_id = MemberId::from_index(0);

    println!("transferring 100.00 from equity to Carol...");
    let response = send(
        &router,
        &zone_id,
        &dave,
        ZoneCommand::AddTransaction {
            acting_as: dave_member_id,
            from: zone.equity_account_id.clone(),
            to: carol_account.id.clone(),
            value: "100.00".parse().unwrap(),
            description: Some("initial stake".to_string()),
            metadata: None,
        },
    )
    .await;
    println!("  {response:?}");

    println!("attempting to overdraw Carol's account (expected rejection)...");
    let response = send(
        &router,
        &zone_id,
        &carol,
        ZoneCommand::AddTransaction {
            acting_as: carol_member.id.clone(),
            from: carol_account.id.clone(),
            to: zone.equity_account_id.clone(),
            value: "1000.00".parse().unwrap(),
            description: None,
            metadata: None,
        },
    )
    .await;
    println!("  {response:?}");
    assert!(response.is_failure(), "overdraw must be rejected");

    println!("attempting a reflexive transaction (expected rejection)...");
    let response = send(
        &router,
        &zone_id,
        &carol,
        ZoneCommand::AddTransaction {
            acting_as: carol_member.id,
            from: carol_account.id.clone(),
            to: carol_account.id,
            value: "1.00".parse().unwrap(),
            description: None,
            metadata: None,
        },
    )
    .await;
    println!("  {response:?}");
    assert!(response.is_failure(), "reflexive transaction must be rejected");

    println!("walkthrough complete.");
}
