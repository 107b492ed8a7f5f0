//! Field-level checks shared by every command validator.

use crate::Validated;
use liquidity_crypto::{KeyError, PublicKeyDer};
use liquidity_types::{
    ErrorCode, RawPublicKey, MAXIMUM_METADATA_SIZE, MAXIMUM_TAG_LENGTH,
};

/// A tag (zone/member/account name) must be at most [`MAXIMUM_TAG_LENGTH`]
/// UTF-8 characters.
pub fn tag(value: &Option<String>) -> Validated<Option<String>> {
    match value {
        Some(s) if s.chars().count() > MAXIMUM_TAG_LENGTH => {
            Err(vec![ErrorCode::TagLengthExceeded(MAXIMUM_TAG_LENGTH)])
        }
        other => Ok(other.clone()),
    }
}

/// Metadata, once serialised to JSON, must be at most
/// [`MAXIMUM_METADATA_SIZE`] bytes.
pub fn metadata(value: &Option<serde_json::Value>) -> Validated<Option<serde_json::Value>> {
    match value {
        Some(v) => {
            let size = serde_json::to_vec(v).map(|b| b.len()).unwrap_or(usize::MAX);
            if size > MAXIMUM_METADATA_SIZE {
                Err(vec![ErrorCode::MetadataLengthExceeded(MAXIMUM_METADATA_SIZE)])
            } else {
                Ok(Some(v.clone()))
            }
        }
        None => Ok(None),
    }
}

/// Parse and validate a single raw public key.
pub fn public_key(raw: &RawPublicKey) -> Validated<PublicKeyDer> {
    PublicKeyDer::from_der(&raw.0).map_err(|e| vec![key_error_code(e)])
}

/// A non-empty set of raw public keys, each individually validated. Errors
/// from every malformed key accumulate rather than stopping at the first.
pub fn public_keys(raw: &[RawPublicKey]) -> Validated<std::collections::BTreeSet<PublicKeyDer>> {
    if raw.is_empty() {
        return Err(vec![ErrorCode::NoPublicKeys]);
    }
    crate::accumulate(raw.iter().map(public_key)).map(|keys| keys.into_iter().collect())
}

fn key_error_code(e: KeyError) -> ErrorCode {
    match e {
        KeyError::InvalidEncoding | KeyError::InvalidBase64 => ErrorCode::InvalidPublicKey,
        KeyError::UnsupportedKeyType => ErrorCode::InvalidPublicKeyType,
        KeyError::InvalidModulusLength { .. } => ErrorCode::InvalidPublicKeyLength,
    }
}
