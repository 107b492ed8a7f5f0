//! The Event Applier (§4.3): the one function that folds a persisted event
//! into `ZoneState`. Used identically on replay and in live operation, so it
//! must be pure, deterministic and total over every `ZoneEvent` variant.

use liquidity_types::{events::ClientId, MemberId, Zone, ZoneEvent, ZoneEventEnvelope, ZoneState};
use rust_decimal::Decimal;

/// Fold one envelope into `state`, in place.
///
/// This never fails: every event in a zone's journal was, by construction,
/// produced by a command that already passed the Validation Suite, so the
/// state transition it describes is always well-formed. A transition that
/// turned out not to be would be a fatal programming error (§7 stratum 3),
/// not something this function reports.
pub fn apply(state: &mut ZoneState, envelope: &ZoneEventEnvelope) {
    match &envelope.zone_event {
        ZoneEvent::ZoneCreated { zone } => apply_zone_created(state, zone),
        ZoneEvent::ClientJoined { client_id } => {
            apply_client_joined(state, *client_id, envelope)
        }
        ZoneEvent::ClientQuit { client_id } => apply_client_quit(state, *client_id),
        ZoneEvent::ZoneNameChanged { name } => {
            if let Some(zone) = state.zone.as_mut() {
                zone.name = name.clone();
            }
        }
        ZoneEvent::MemberCreated { member } | ZoneEvent::MemberUpdated { member } => {
            if let Some(zone) = state.zone.as_mut() {
                zone.members.insert(member.id.clone(), member.clone());
            }
        }
        ZoneEvent::AccountCreated { account } => {
            if let Some(zone) = state.zone.as_mut() {
                zone.accounts.insert(account.id.clone(), account.clone());
                state.balances.insert(account.id.clone(), Decimal::ZERO);
            }
        }
        ZoneEvent::AccountUpdated { account, .. } => {
            if let Some(zone) = state.zone.as_mut() {
                zone.accounts.insert(account.id.clone(), account.clone());
            }
        }
        ZoneEvent::TransactionAdded { transaction } => {
            if let Some(zone) = state.zone.as_mut() {
                if let Some(balance) = state.balances.get_mut(&transaction.from) {
                    *balance -= transaction.value;
                }
                if let Some(balance) = state.balances.get_mut(&transaction.to) {
                    *balance += transaction.value;
                }
                zone.transactions
                    .insert(transaction.id.clone(), transaction.clone());
            }
        }
    }
}

fn apply_zone_created(state: &mut ZoneState, zone: &Zone) {
    for account_id in zone.accounts.keys() {
        state.balances.insert(account_id.clone(), Decimal::ZERO);
    }
    state.zone = Some(zone.clone());
}

fn apply_client_joined(state: &mut ZoneState, client_id: ClientId, envelope: &ZoneEventEnvelope) {
    // The Passivation Timer is signalled by comparing connected-client
    // counts before and after `apply` at the call site (the validator's
    // main loop), not from in here - keeping this function a pure fold.
    if let Some(public_key) = envelope.public_key.clone() {
        state.connected_clients.insert(client_id, public_key);
    }
}

fn apply_client_quit(state: &mut ZoneState, client_id: ClientId) {
    state.connected_clients.shift_remove(&client_id);
}

/// Resolve the member a legacy `AccountUpdated` notification should
/// attribute the change to, when the persisted event carries no
/// `acting_as` (§9 Open Questions). Deterministic choice: the numerically
/// lowest member id among the account's owners, not set-iteration order.
pub fn legacy_acting_as(account: &liquidity_types::Account) -> Option<MemberId> {
    account
        .owner_member_ids
        .iter()
        .min_by_key(|id| id.as_index().unwrap_or(u64::MAX))
        .cloned()
}
