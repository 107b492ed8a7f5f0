//! One validator per command in §4.1's dispatch table.

use crate::checks::{metadata, public_key, public_keys, tag};
use crate::{combine, combine3, combine4, Validated};
use liquidity_crypto::PublicKeyDer;
use liquidity_types::{
    AccountId, AccountInput, ErrorCode, MemberId, MemberInput, RawPublicKey, Zone, ZoneState,
};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

fn zone(state: &ZoneState) -> Validated<&Zone> {
    state.zone.as_ref().ok_or_else(|| vec![ErrorCode::ZoneDoesNotExist])
}

fn member_exists(zone: &Zone, id: &MemberId) -> Validated<()> {
    if zone.members.contains_key(id) {
        Ok(())
    } else {
        Err(vec![ErrorCode::MemberDoesNotExist(id.clone())])
    }
}

/// A caller may act as `member_id` only if their key is one of that
/// member's owning keys.
fn caller_owns_member(zone: &Zone, caller: &PublicKeyDer, member_id: &MemberId) -> Validated<()> {
    match zone.members.get(member_id) {
        Some(member) if member.owner_public_keys.contains(caller) => Ok(()),
        _ => Err(vec![ErrorCode::MemberKeyMismatch]),
    }
}

fn member_ids_exist(zone: &Zone, ids: &BTreeSet<MemberId>) -> Validated<()> {
    if ids.is_empty() {
        return Err(vec![ErrorCode::NoMemberIds]);
    }
    crate::accumulate(ids.iter().map(|id| member_exists(zone, id))).map(|_| ())
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateZoneEffect {
    pub equity_owner_public_key: PublicKeyDer,
    pub equity_owner_name: Option<String>,
    pub equity_owner_metadata: Option<serde_json::Value>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// `CreateZone` needs no zone-state check: creating a zone that already
/// exists is redelivery, handled as idempotence by the Command Handler, not
/// a validation failure.
pub fn validate_create_zone(
    equity_owner_public_key: &RawPublicKey,
    equity_owner_name: &Option<String>,
    equity_owner_metadata: &Option<serde_json::Value>,
    name: &Option<String>,
    metadata_field: &Option<serde_json::Value>,
) -> Validated<CreateZoneEffect> {
    combine4(
        public_key(equity_owner_public_key),
        tag(equity_owner_name),
        metadata(equity_owner_metadata),
        combine(tag(name), metadata(metadata_field)),
    )
    .map(
        |(equity_owner_public_key, equity_owner_name, equity_owner_metadata, (name, metadata))| {
            CreateZoneEffect {
                equity_owner_public_key,
                equity_owner_name,
                equity_owner_metadata,
                name,
                metadata,
            }
        },
    )
}

pub fn validate_join_zone(state: &ZoneState) -> Validated<()> {
    zone(state).map(|_| ())
}

pub fn validate_quit_zone(state: &ZoneState) -> Validated<()> {
    zone(state).map(|_| ())
}

pub fn validate_change_zone_name(
    state: &ZoneState,
    name: &Option<String>,
) -> Validated<Option<String>> {
    combine(zone(state).map(|_| ()), tag(name)).map(|(_, name)| name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateMemberEffect {
    pub owner_public_keys: BTreeSet<PublicKeyDer>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub fn validate_create_member(state: &ZoneState, input: &MemberInput) -> Validated<CreateMemberEffect> {
    combine4(
        zone(state).map(|_| ()),
        public_keys(&input.owner_public_keys),
        tag(&input.name),
        metadata(&input.metadata),
    )
    .map(|(_, owner_public_keys, name, metadata)| CreateMemberEffect {
        owner_public_keys,
        name,
        metadata,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateMemberEffect {
    pub owner_public_keys: BTreeSet<PublicKeyDer>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub fn validate_update_member(
    state: &ZoneState,
    caller: &PublicKeyDer,
    id: &MemberId,
    input: &MemberInput,
) -> Validated<UpdateMemberEffect> {
    let z = zone(state)?;
    combine4(
        member_exists(z, id).and_then(|_| caller_owns_member(z, caller, id)),
        public_keys(&input.owner_public_keys),
        tag(&input.name),
        metadata(&input.metadata),
    )
    .map(|(_, owner_public_keys, name, metadata)| UpdateMemberEffect {
        owner_public_keys,
        name,
        metadata,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateAccountEffect {
    pub owner_member_ids: BTreeSet<MemberId>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub fn validate_create_account(
    state: &ZoneState,
    input: &AccountInput,
) -> Validated<CreateAccountEffect> {
    let z = zone(state)?;
    let owner_member_ids: BTreeSet<MemberId> = input.owner_member_ids.iter().cloned().collect();
    combine3(
        member_ids_exist(z, &owner_member_ids),
        tag(&input.name),
        metadata(&input.metadata),
    )
    .map(|(_, name, metadata)| CreateAccountEffect {
        owner_member_ids,
        name,
        metadata,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAccountEffect {
    pub owner_member_ids: BTreeSet<MemberId>,
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// "may update ... an Account only if `actingAs ∈ account.owner_member_ids`
/// AND caller owns `actingAs`" (§4.2).
fn acting_as_authorised(
    z: &Zone,
    caller: &PublicKeyDer,
    acting_as: &MemberId,
    account_id: &AccountId,
) -> Validated<()> {
    let membership = caller_owns_member(z, caller, acting_as);
    let ownership = match z.accounts.get(account_id) {
        Some(account) if account.owner_member_ids.contains(acting_as) => Ok(()),
        Some(_) => Err(vec![ErrorCode::AccountOwnerMismatch]),
        None => Err(vec![ErrorCode::AccountDoesNotExist(account_id.clone())]),
    };
    combine(membership, ownership).map(|_| ())
}

pub fn validate_update_account(
    state: &ZoneState,
    caller: &PublicKeyDer,
    acting_as: &MemberId,
    id: &AccountId,
    input: &AccountInput,
) -> Validated<UpdateAccountEffect> {
    let z = zone(state)?;
    let owner_member_ids: BTreeSet<MemberId> = input.owner_member_ids.iter().cloned().collect();
    combine4(
        acting_as_authorised(z, caller, acting_as, id),
        member_ids_exist(z, &owner_member_ids),
        tag(&input.name),
        metadata(&input.metadata),
    )
    .map(|(_, _, name, metadata)| UpdateAccountEffect {
        owner_member_ids,
        name,
        metadata,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddTransactionEffect {
    pub from: AccountId,
    pub to: AccountId,
    pub value: Decimal,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub fn validate_add_transaction(
    state: &ZoneState,
    caller: &PublicKeyDer,
    acting_as: &MemberId,
    from: &AccountId,
    to: &AccountId,
    value: Decimal,
    description: &Option<String>,
    metadata_field: &Option<serde_json::Value>,
) -> Validated<AddTransactionEffect> {
    let z = zone(state)?;

    let reflexive = if from == to {
        Err(vec![ErrorCode::ReflexiveTransaction])
    } else {
        Ok(())
    };

    let debit_rights = match z.accounts.get(from) {
        None => Err(vec![ErrorCode::SourceAccountDoesNotExist]),
        Some(account) => combine(
            caller_owns_member(z, caller, acting_as),
            if account.owner_member_ids.contains(acting_as) {
                Ok(())
            } else {
                Err(vec![ErrorCode::AccountOwnerMismatch])
            },
        )
        .map(|_| ()),
    };

    let destination = match z.accounts.get(to) {
        Some(_) => Ok(()),
        None => Err(vec![ErrorCode::DestinationAccountDoesNotExist]),
    };

    let non_negative = if value < Decimal::ZERO {
        Err(vec![ErrorCode::NegativeTransactionValue])
    } else {
        Ok(())
    };

    let sufficient_balance = if from == &z.equity_account_id {
        Ok(())
    } else {
        match (state.balances.get(from), value >= Decimal::ZERO) {
            (Some(balance), true) if *balance - value >= Decimal::ZERO => Ok(()),
            (Some(_), true) => Err(vec![ErrorCode::InsufficientBalance]),
            // value < 0 already reported by `non_negative`; don't double-report.
            _ => Ok(()),
        }
    };

    let well_formed = combine(reflexive, debit_rights).map(|_| ());
    let description_and_metadata = combine(tag(description), metadata(metadata_field));

    combine(
        combine4(well_formed, destination, non_negative, sufficient_balance),
        description_and_metadata,
    )
    .map(|(_, (description, metadata))| AddTransactionEffect {
        from: from.clone(),
        to: to.clone(),
        value,
        description,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquidity_crypto::testing::TestIdentity;
    use liquidity_types::{Account, Member};
    use std::str::FromStr;

    fn fixture() -> (ZoneState, TestIdentity, TestIdentity) {
        let dave = TestIdentity::generate();
        let jenny = TestIdentity::generate();

        let mut zone = Zone {
            id: liquidity_types::ZoneId::new(),
            equity_account_id: AccountId::from_index(0),
            members: Default::default(),
            accounts: Default::default(),
            transactions: Default::default(),
            created: chrono::Utc::now(),
            expires: chrono::Utc::now(),
            name: Some("Dave's Game".to_string()),
            metadata: None,
        };
        zone.members.insert(
            MemberId::from_index(0),
            Member {
                id: MemberId::from_index(0),
                owner_public_keys: [dave.public_key().clone()].into_iter().collect(),
                name: Some("Dave".to_string()),
                metadata: None,
            },
        );
        zone.accounts.insert(
            AccountId::from_index(0),
            Account {
                id: AccountId::from_index(0),
                owner_member_ids: [MemberId::from_index(0)].into_iter().collect(),
                name: None,
                metadata: None,
            },
        );
        zone.members.insert(
            MemberId::from_index(1),
            Member {
                id: MemberId::from_index(1),
                owner_public_keys: [jenny.public_key().clone()].into_iter().collect(),
                name: Some("Jenny".to_string()),
                metadata: None,
            },
        );
        zone.accounts.insert(
            AccountId::from_index(1),
            Account {
                id: AccountId::from_index(1),
                owner_member_ids: [MemberId::from_index(1)].into_iter().collect(),
                name: Some("Jenny's Account".to_string()),
                metadata: None,
            },
        );

        let mut state = ZoneState::empty();
        state.balances.insert(
            AccountId::from_index(0),
            Decimal::from_str("-5000000000000000000000").unwrap(),
        );
        state.balances.insert(
            AccountId::from_index(1),
            Decimal::from_str("5000000000000000000000").unwrap(),
        );
        state.zone = Some(zone);

        (state, dave, jenny)
    }

    #[test]
    fn rejects_commands_against_a_nonexistent_zone() {
        let state = ZoneState::empty();
        assert_eq!(
            validate_join_zone(&state),
            Err(vec![ErrorCode::ZoneDoesNotExist])
        );
    }

    #[test]
    fn rejects_overdraw_from_non_equity_account() {
        let (state, _dave, jenny) = fixture();
        let result = validate_add_transaction(
            &state,
            jenny.public_key(),
            &MemberId::from_index(1),
            &AccountId::from_index(1),
            &AccountId::from_index(0),
            Decimal::from_str("5000000000000000000001").unwrap(),
            &None,
            &None,
        );
        assert_eq!(result, Err(vec![ErrorCode::InsufficientBalance]));
    }

    #[test]
    fn equity_account_may_go_negative() {
        let (state, dave, _jenny) = fixture();
        let result = validate_add_transaction(
            &state,
            dave.public_key(),
            &MemberId::from_index(0),
            &AccountId::from_index(0),
            &AccountId::from_index(1),
            Decimal::from_str("1000000000000000000000000").unwrap(),
            &None,
            &None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_reflexive_transaction() {
        let (state, _dave, jenny) = fixture();
        let result = validate_add_transaction(
            &state,
            jenny.public_key(),
            &MemberId::from_index(1),
            &AccountId::from_index(1),
            &AccountId::from_index(1),
            Decimal::ONE,
            &None,
            &None,
        );
        assert_eq!(result.unwrap_err(), vec![ErrorCode::ReflexiveTransaction]);
    }

    #[test]
    fn rejects_key_mismatch_on_member_update() {
        let (state, _dave, _jenny) = fixture();
        let impostor = TestIdentity::generate();
        let result = validate_update_member(
            &state,
            impostor.public_key(),
            &MemberId::from_index(0),
            &MemberInput {
                owner_public_keys: vec![],
                name: Some("Dave".to_string()),
                metadata: None,
            },
        );
        assert!(result.unwrap_err().contains(&ErrorCode::MemberKeyMismatch));
    }

    #[test]
    fn accumulates_independent_errors() {
        let (state, dave, _jenny) = fixture();
        // Reflexive AND negative value AND nonexistent destination: every
        // independent check should fire, not just the first.
        let result = validate_add_transaction(
            &state,
            dave.public_key(),
            &MemberId::from_index(0),
            &AccountId::from_index(0),
            &AccountId::from_index(0),
            Decimal::from_str("-1").unwrap(),
            &None,
            &None,
        );
        let errors = result.unwrap_err();
        assert!(errors.contains(&ErrorCode::ReflexiveTransaction));
        assert!(errors.contains(&ErrorCode::NegativeTransactionValue));
    }
}
