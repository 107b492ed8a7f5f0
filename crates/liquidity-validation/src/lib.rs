//! Pure command validation for the Liquidity zone validator (§4.2).
//!
//! Every function here is a deterministic, side-effect-free map from a
//! command (and, where needed, the current [`ZoneState`]) to either the data
//! the Command Handler needs to build an event, or the non-empty list of
//! [`ErrorCode`]s that rejected it. Independent checks accumulate their
//! errors via [`combine`]; dependent checks short-circuit with `and_then`,
//! per §9's "Validation accumulation" design note.

mod checks;
mod commands;

pub use checks::{metadata, tag};
pub use commands::{
    validate_add_transaction, validate_change_zone_name, validate_create_account,
    validate_create_member, validate_create_zone, validate_join_zone, validate_quit_zone,
    validate_update_account, validate_update_member, AddTransactionEffect, CreateAccountEffect,
    CreateMemberEffect, CreateZoneEffect, UpdateAccountEffect, UpdateMemberEffect,
};

use liquidity_types::ErrorCode;

/// The result of one validator: the validated value, or every error that
/// independently rejected it.
pub type Validated<T> = Result<T, Vec<ErrorCode>>;

/// Combine two independent checks. If either side fails, the result fails
/// with the concatenation of both error lists - neither check short-circuits
/// the other.
pub fn combine<A, B>(a: Validated<A>, b: Validated<B>) -> Validated<(A, B)> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(_)) => Err(e),
        (Err(mut e1), Err(e2)) => {
            e1.extend(e2);
            Err(e1)
        }
    }
}

/// Combine three independent checks, accumulating errors from all of them.
pub fn combine3<A, B, C>(a: Validated<A>, b: Validated<B>, c: Validated<C>) -> Validated<(A, B, C)> {
    combine(combine(a, b), c).map(|((a, b), c)| (a, b, c))
}

/// Combine four independent checks, accumulating errors from all of them.
pub fn combine4<A, B, C, D>(
    a: Validated<A>,
    b: Validated<B>,
    c: Validated<C>,
    d: Validated<D>,
) -> Validated<(A, B, C, D)> {
    combine(combine3(a, b, c), d).map(|((a, b, c), d)| (a, b, c, d))
}

/// Reduce a batch of independent checks (e.g. one per supplied public key)
/// into a single pass/fail, accumulating every failure's errors.
pub fn accumulate<T>(results: impl IntoIterator<Item = Validated<T>>) -> Validated<Vec<T>> {
    let mut values = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(v) => values.push(v),
            Err(e) => errors.extend(e),
        }
    }
    if errors.is_empty() {
        Ok(values)
    } else {
        Err(errors)
    }
}
