//! The Command Handler (§4.1): decode, validate, and decide what to do with
//! one `ZoneCommand` against the validator's current `ZoneState`.
//!
//! This module never touches I/O and never mutates `ZoneState` - it only
//! decides. The caller (`Validator::handle`) is responsible for persisting
//! the resulting event (if any) through the Event Applier and for fanning
//! out the notification.

use crate::apply::legacy_acting_as;
use chrono::Utc;
use liquidity_crypto::PublicKeyDer;
use liquidity_types::{
    events::ClientId, Account, AccountId, ErrorCode, Member, MemberId, Transaction, Zone,
    ZoneCommand, ZoneEvent, ZoneId, ZoneNotification, ZoneResponse, ZoneState, ZONE_LIFETIME,
};
use liquidity_validation as validation;
use std::collections::BTreeMap;

/// What the validator should do in response to one command.
pub enum Decision {
    /// The Validation Suite rejected the command. Nothing is persisted.
    Reject(Vec<ErrorCode>),
    /// The command is valid but, per the redelivery-idempotence rule
    /// (§4.1 step 2), applying it would leave state unchanged. Respond with
    /// the given (already-current) success value; persist nothing.
    NoOp(ZoneResponse),
    /// The command is valid and changes state: persist `event`, apply it,
    /// respond with `response`, and (if `notification` is `Some`) fan it out
    /// to every connected client.
    Persist {
        event: ZoneEvent,
        response: ZoneResponse,
        notification: Option<ZoneNotification>,
    },
}

/// Decide the outcome of `command`, issued by `caller` over connection
/// `client_id`, against `state`. `zone_id` is the identifier this validator
/// instance owns (assigned by the Sharding Router, not the command).
pub fn decide(
    state: &ZoneState,
    zone_id: &ZoneId,
    client_id: ClientId,
    caller: &PublicKeyDer,
    command: &ZoneCommand,
) -> Decision {
    match command {
        ZoneCommand::CreateZone {
            equity_owner_public_key,
            equity_owner_name,
            equity_owner_metadata,
            name,
            metadata,
        } => create_zone(
            state,
            zone_id,
            equity_owner_public_key,
            equity_owner_name,
            equity_owner_metadata,
            name,
            metadata,
        ),
        ZoneCommand::JoinZone => join_zone(state, client_id, caller),
        ZoneCommand::QuitZone => quit_zone(state, client_id),
        ZoneCommand::ChangeZoneName { name } => change_zone_name(state, name),
        ZoneCommand::CreateMember(input) => create_member(state, input),
        ZoneCommand::UpdateMember { id, update } => update_member(state, caller, id, update),
        ZoneCommand::CreateAccount(input) => create_account(state, input),
        ZoneCommand::UpdateAccount {
            acting_as,
            id,
            update,
        } => update_account(state, caller, acting_as, id, update),
        ZoneCommand::AddTransaction {
            acting_as,
            from,
            to,
            value,
            description,
            metadata,
        } => add_transaction(state, caller, acting_as, from, to, *value, description, metadata),
    }
}

#[allow(clippy::too_many_arguments)]
fn create_zone(
    state: &ZoneState,
    zone_id: &ZoneId,
    equity_owner_public_key: &liquidity_types::RawPublicKey,
    equity_owner_name: &Option<String>,
    equity_owner_metadata: &Option<serde_json::Value>,
    name: &Option<String>,
    metadata: &Option<serde_json::Value>,
) -> Decision {
    if let Some(existing) = &state.zone {
        // Redelivery of an already-accepted CreateZone: respond with the
        // zone as it stands, persist nothing.
        return Decision::NoOp(ZoneResponse::CreateZone(existing.clone()));
    }

    let effect = match validation::validate_create_zone(
        equity_owner_public_key,
        equity_owner_name,
        equity_owner_metadata,
        name,
        metadata,
    ) {
        Ok(effect) => effect,
        Err(errors) => return Decision::Reject(errors),
    };

    let equity_member = Member {
        id: MemberId::from_index(0),
        owner_public_keys: [effect.equity_owner_public_key].into_iter().collect(),
        name: effect.equity_owner_name,
        metadata: effect.equity_owner_metadata,
    };
    let equity_account = Account {
        id: AccountId::from_index(0),
        owner_member_ids: [equity_member.id.clone()].into_iter().collect(),
        name: None,
        metadata: None,
    };

    let created = Utc::now();
    let mut zone = Zone {
        id: zone_id.clone(),
        equity_account_id: equity_account.id.clone(),
        members: Default::default(),
        accounts: Default::default(),
        transactions: Default::default(),
        created,
        expires: created + chrono::Duration::from_std(ZONE_LIFETIME).unwrap(),
        name: effect.name,
        metadata: effect.metadata,
    };
    zone.members.insert(equity_member.id.clone(), equity_member);
    zone.accounts.insert(equity_account.id.clone(), equity_account);

    Decision::Persist {
        response: ZoneResponse::CreateZone(zone.clone()),
        event: ZoneEvent::ZoneCreated { zone },
        notification: None,
    }
}

fn join_zone(state: &ZoneState, client_id: ClientId, caller: &PublicKeyDer) -> Decision {
    if let Err(errors) = validation::validate_join_zone(state) {
        return Decision::Reject(errors);
    }
    if state.connected_clients.contains_key(&client_id) {
        return Decision::NoOp(join_zone_response(state));
    }
    let _ = caller;
    Decision::Persist {
        event: ZoneEvent::ClientJoined { client_id },
        response: join_zone_response(state),
        notification: Some(ZoneNotification::ClientJoined {
            client_id,
            public_key: caller.clone(),
        }),
    }
}

fn join_zone_response(state: &ZoneState) -> ZoneResponse {
    // Note this is called both before the join is applied (to build the
    // idempotent no-op reply) and is re-derived by the validator after a
    // real join is applied, so it always reflects the connected-clients set
    // the caller is about to observe.
    ZoneResponse::JoinZone {
        zone: state.zone.clone().expect("validated above"),
        connected_clients: state
            .connected_clients
            .iter()
            .map(|(id, key)| (*id, key.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn quit_zone(state: &ZoneState, client_id: ClientId) -> Decision {
    if let Err(errors) = validation::validate_quit_zone(state) {
        return Decision::Reject(errors);
    }
    let public_key = match state.connected_clients.get(&client_id) {
        Some(key) => key.clone(),
        None => return Decision::NoOp(ZoneResponse::QuitZone),
    };
    Decision::Persist {
        event: ZoneEvent::ClientQuit { client_id },
        response: ZoneResponse::QuitZone,
        notification: Some(ZoneNotification::ClientQuit {
            client_id,
            public_key,
        }),
    }
}

fn change_zone_name(state: &ZoneState, name: &Option<String>) -> Decision {
    let validated_name = match validation::validate_change_zone_name(state, name) {
        Ok(name) => name,
        Err(errors) => return Decision::Reject(errors),
    };
    let zone = state.zone.as_ref().expect("validated above");
    if zone.name == validated_name {
        return Decision::NoOp(ZoneResponse::ChangeZoneName);
    }
    Decision::Persist {
        event: ZoneEvent::ZoneNameChanged {
            name: validated_name.clone(),
        },
        response: ZoneResponse::ChangeZoneName,
        notification: Some(ZoneNotification::ZoneNameChanged {
            name: validated_name,
        }),
    }
}

fn create_member(state: &ZoneState, input: &liquidity_types::MemberInput) -> Decision {
    let effect = match validation::validate_create_member(state, input) {
        Ok(effect) => effect,
        Err(errors) => return Decision::Reject(errors),
    };
    let zone = state.zone.as_ref().expect("validated above");
    let member = Member {
        id: zone.next_member_id(),
        owner_public_keys: effect.owner_public_keys,
        name: effect.name,
        metadata: effect.metadata,
    };
    Decision::Persist {
        response: ZoneResponse::CreateMember(member.clone()),
        notification: Some(ZoneNotification::MemberCreated {
            member: member.clone(),
        }),
        event: ZoneEvent::MemberCreated { member },
    }
}

fn update_member(
    state: &ZoneState,
    caller: &PublicKeyDer,
    id: &MemberId,
    input: &liquidity_types::MemberInput,
) -> Decision {
    let effect = match validation::validate_update_member(state, caller, id, input) {
        Ok(effect) => effect,
        Err(errors) => return Decision::Reject(errors),
    };
    let zone = state.zone.as_ref().expect("validated above");
    let current = &zone.members[id];
    let updated = Member {
        id: id.clone(),
        owner_public_keys: effect.owner_public_keys,
        name: effect.name,
        metadata: effect.metadata,
    };
    // Idempotence per §4.1/§9: full structural equality, including metadata
    // - a caller who only reformats unchanged metadata sees "no change".
    if *current == updated {
        return Decision::NoOp(ZoneResponse::UpdateMember);
    }
    Decision::Persist {
        response: ZoneResponse::UpdateMember,
        notification: Some(ZoneNotification::MemberUpdated {
            member: updated.clone(),
        }),
        event: ZoneEvent::MemberUpdated { member: updated },
    }
}

fn create_account(state: &ZoneState, input: &liquidity_types::AccountInput) -> Decision {
    let effect = match validation::validate_create_account(state, input) {
        Ok(effect) => effect,
        Err(errors) => return Decision::Reject(errors),
    };
    let zone = state.zone.as_ref().expect("validated above");
    let account = Account {
        id: zone.next_account_id(),
        owner_member_ids: effect.owner_member_ids,
        name: effect.name,
        metadata: effect.metadata,
    };
    Decision::Persist {
        response: ZoneResponse::CreateAccount(account.clone()),
        notification: Some(ZoneNotification::AccountCreated {
            account: account.clone(),
        }),
        event: ZoneEvent::AccountCreated { account },
    }
}

fn update_account(
    state: &ZoneState,
    caller: &PublicKeyDer,
    acting_as: &MemberId,
    id: &AccountId,
    input: &liquidity_types::AccountInput,
) -> Decision {
    let effect = match validation::validate_update_account(state, caller, acting_as, id, input) {
        Ok(effect) => effect,
        Err(errors) => return Decision::Reject(errors),
    };
    let zone = state.zone.as_ref().expect("validated above");
    let current = &zone.accounts[id];
    let updated = Account {
        id: id.clone(),
        owner_member_ids: effect.owner_member_ids,
        name: effect.name,
        metadata: effect.metadata,
    };
    if *current == updated {
        return Decision::NoOp(ZoneResponse::UpdateAccount);
    }
    Decision::Persist {
        response: ZoneResponse::UpdateAccount,
        notification: Some(ZoneNotification::AccountUpdated {
            acting_as: acting_as.clone(),
            account: updated.clone(),
        }),
        event: ZoneEvent::AccountUpdated {
            acting_as: Some(acting_as.clone()),
            account: updated,
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn add_transaction(
    state: &ZoneState,
    caller: &PublicKeyDer,
    acting_as: &MemberId,
    from: &AccountId,
    to: &AccountId,
    value: rust_decimal::Decimal,
    description: &Option<String>,
    metadata: &Option<serde_json::Value>,
) -> Decision {
    let effect = match validation::validate_add_transaction(
        state, caller, acting_as, from, to, value, description, metadata,
    ) {
        Ok(effect) => effect,
        Err(errors) => return Decision::Reject(errors),
    };
    let zone = state.zone.as_ref().expect("validated above");
    let transaction = Transaction {
        id: zone.next_transaction_id(),
        from: effect.from,
        to: effect.to,
        value: effect.value,
        creator: acting_as.clone(),
        created: Utc::now(),
        description: effect.description,
        metadata: effect.metadata,
    };
    Decision::Persist {
        response: ZoneResponse::AddTransaction(transaction.clone()),
        notification: Some(ZoneNotification::TransactionAdded {
            transaction: transaction.clone(),
        }),
        event: ZoneEvent::TransactionAdded { transaction },
    }
}

/// Resolve the notification for a (possibly legacy) `AccountUpdated` event
/// replayed from the journal, for callers that only have the event, not the
/// live `Decision` that produced it (e.g. a catch-up subscriber).
pub fn account_updated_notification(
    acting_as: &Option<MemberId>,
    account: &Account,
) -> ZoneNotification {
    let acting_as = acting_as
        .clone()
        .or_else(|| legacy_acting_as(account))
        .expect("account has at least one owner (invariant: NoMemberIds)");
    ZoneNotification::AccountUpdated {
        acting_as,
        account: account.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquidity_crypto::testing::TestIdentity;
    use liquidity_types::RawPublicKey;

    #[test]
    fn create_zone_assigns_equity_account_zero() {
        let state = ZoneState::empty();
        let dave = TestIdentity::generate();
        let decision = create_zone(
            &state,
            &ZoneId::new(),
            &RawPublicKey(dave.public_key().as_der().to_vec()),
            &Some("Dave".to_string()),
            &None,
            &Some("Dave's Game".to_string()),
            &None,
        );
        match decision {
            Decision::Persist { response, .. } => match response {
                ZoneResponse::CreateZone(zone) => {
                    assert_eq!(zone.equity_account_id, AccountId::from_index(0));
                    assert_eq!(zone.members[&MemberId::from_index(0)].name, Some("Dave".to_string()));
                }
                _ => panic!("expected CreateZone response"),
            },
            _ => panic!("expected Persist"),
        }
    }

    #[test]
    fn zone_lifetime_matches_the_spec_worked_example() {
        // created=1514156286183 -> expires=1516748286183, a 30-day delta.
        let created = chrono::DateTime::from_timestamp_millis(1_514_156_286_183).unwrap();
        let expires = created + chrono::Duration::from_std(ZONE_LIFETIME).unwrap();
        assert_eq!(expires.timestamp_millis(), 1_516_748_286_183);
    }

    #[test]
    fn redelivered_create_zone_is_a_no_op() {
        let state = ZoneState::empty();
        let dave = TestIdentity::generate();
        let raw = RawPublicKey(dave.public_key().as_der().to_vec());
        let zone_id = ZoneId::new();
        let first = create_zone(&state, &zone_id, &raw, &None, &None, &None, &None);
        let mut state_with_zone = ZoneState::empty();
        if let Decision::Persist { event, .. } = first {
            crate::apply::apply(
                &mut state_with_zone,
                &liquidity_types::ZoneEventEnvelope {
                    remote_address: None,
                    public_key: Some(dave.public_key().clone()),
                    timestamp: Utc::now(),
                    zone_event: event,
                },
            );
        }
        let second = create_zone(&state_with_zone, &zone_id, &raw, &None, &None, &None, &None);
        assert!(matches!(second, Decision::NoOp(_)));
    }

    #[test]
    fn redelivered_change_zone_name_is_a_no_op() {
        let mut state = ZoneState::empty();
        let dave = TestIdentity::generate();
        let raw = RawPublicKey(dave.public_key().as_der().to_vec());
        if let Decision::Persist { event, .. } = create_zone(
            &state,
            &ZoneId::new(),
            &raw,
            &None,
            &None,
            &Some("Dave's Game".to_string()),
            &None,
        ) {
            crate::apply::apply(
                &mut state,
                &liquidity_types::ZoneEventEnvelope {
                    remote_address: None,
                    public_key: Some(dave.public_key().clone()),
                    timestamp: Utc::now(),
                    zone_event: event,
                },
            );
        }
        let decision = change_zone_name(&state, &Some("Dave's Game".to_string()));
        assert!(matches!(decision, Decision::NoOp(_)));
    }
}
