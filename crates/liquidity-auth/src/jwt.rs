//! Self-asserted identity tokens.
//!
//! There is no central identity store or server-held signing secret: a
//! caller mints their own RS256 JWT, setting `sub` to the base64 of their
//! own RSA public key, and signs it with the matching private key. The
//! gateway's job is narrower than a conventional JWT verifier's - it never
//! looks up a signing key anywhere, it extracts the key the caller is
//! claiming to hold from the token itself and checks the token's signature
//! against exactly that key. Holding the private key behind a public key is
//! the caller's entire proof of identity; `liquidity-zone` then authorizes
//! individual operations by comparing that key, byte for byte, against the
//! keys recorded on zone members and accounts.
//!
//! `jsonwebtoken`'s own RSA verification path expects a PKCS#1 DER public
//! key, while [`liquidity_crypto::PublicKeyDer`] stores a
//! SubjectPublicKeyInfo/X.509 DER public key (matching what `liquidity-zone`
//! stores on members and accounts), so this module borrows the decoding
//! half of `jsonwebtoken` (header parsing, claims extraction) and defers the
//! actual signature check to `liquidity_crypto::verify_sha256_signature`.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use liquidity_crypto::{verify_sha256_signature, PublicKeyDer};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// Claims carried by a self-asserted identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Base64 SubjectPublicKeyInfo DER of the caller's own public key.
    pub sub: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Not-before, Unix seconds.
    pub nbf: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

/// Verifies self-asserted identity tokens against the public key they claim.
#[derive(Clone)]
pub struct IdentityVerifier {
    config: AuthConfig,
}

impl IdentityVerifier {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Verify `token` and return the caller's public key on success.
    ///
    /// This checks, in order: the header names `RS256`; the claims parse and
    /// `sub` is a valid RSA-2048 `PublicKeyDer`; the raw token's signature
    /// verifies against that same key; `nbf`/`exp` are satisfied (with
    /// configured clock skew); and the token's total lifetime doesn't exceed
    /// `max_token_lifetime`.
    pub fn verify(&self, token: &str) -> AuthResult<PublicKeyDer> {
        let header = jsonwebtoken::decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        // Decode claims without checking the signature yet - the signing key
        // we need to check it with is embedded in the claims we're decoding.
        let mut peek = Validation::new(Algorithm::RS256);
        peek.insecure_disable_signature_validation();
        peek.validate_exp = false;
        peek.validate_nbf = false;
        peek.required_spec_claims.clear();
        let claims = jsonwebtoken::decode::<IdentityClaims>(
            token,
            &DecodingKey::from_secret(&[]),
            &peek,
        )?
        .claims;

        let public_key = PublicKeyDer::from_base64(&claims.sub)?;

        let (signing_input, signature) = split_signing_input(token).ok_or(AuthError::SignatureMismatch)?;
        verify_sha256_signature(&public_key, signing_input.as_bytes(), &signature)
            .map_err(|_| AuthError::SignatureMismatch)?;

        let now = Utc::now().timestamp();
        let skew = self.config.clock_skew.as_secs() as i64;
        if now < claims.nbf - skew {
            return Err(AuthError::NotYetValid);
        }
        if now > claims.exp + skew {
            return Err(AuthError::Expired);
        }
        let lifetime = claims.exp - claims.iat;
        if lifetime > self.config.max_token_lifetime.as_secs() as i64 {
            return Err(AuthError::LifetimeTooLong(lifetime));
        }

        Ok(public_key)
    }
}

/// Split a compact JWT into its signing input (`header.claims`) and decoded
/// signature bytes.
fn split_signing_input(token: &str) -> Option<(&str, Vec<u8>)> {
    use base64::Engine;
    let mut parts = token.rsplitn(2, '.');
    let signature_b64 = parts.next()?;
    let signing_input = parts.next()?;
    let signature = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .ok()?;
    Some((signing_input, signature))
}

/// Minting helper for tests, demos, and any first-party client that needs to
/// produce a token for itself - never used by the gateway, which only ever
/// verifies.
pub mod testing {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use liquidity_crypto::testing::TestIdentity;
    use std::time::Duration;

    /// Mint a token self-signed by `identity`, valid from now for `lifetime`.
    ///
    /// `jsonwebtoken::encode` can't produce an RS256 signature from our
    /// PKCS1v15/SHA-256 signer directly (it wants a PKCS#1 `EncodingKey`, we
    /// only have the raw signing half in [`TestIdentity`]), so this builds
    /// the header and claims with `jsonwebtoken`, then replaces the
    /// signature segment with one produced by the identity's own key -
    /// exactly mirroring what a real self-asserting client does.
    pub fn mint_self_signed(identity: &TestIdentity, lifetime: Duration) -> String {
        use base64::Engine;

        let now = Utc::now().timestamp();
        let claims = IdentityClaims {
            sub: identity.public_key().to_base64(),
            iat: now,
            nbf: now,
            exp: now + lifetime.as_secs() as i64,
        };
        let header = Header::new(Algorithm::RS256);
        // `encode` needs an `EncodingKey`, but we never use the signature it
        // produces - only the header.claims portion before the dot.
        let unsigned = encode(&header, &claims, &EncodingKey::from_secret(&[])).expect("encode header+claims");
        let signing_input = unsigned.rsplit_once('.').expect("token has a signature segment").0;
        let signature = identity.sign(signing_input.as_bytes());
        let signature_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(signature);
        format!("{signing_input}.{signature_b64}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquidity_crypto::testing::TestIdentity;
    use std::time::Duration;

    #[test]
    fn verifies_a_self_signed_token() {
        let identity = TestIdentity::generate();
        let token = testing::mint_self_signed(&identity, Duration::from_secs(60));
        let verifier = IdentityVerifier::new(AuthConfig::default());
        let verified = verifier.verify(&token).expect("token should verify");
        assert_eq!(&verified, identity.public_key());
    }

    #[test]
    fn rejects_a_token_signed_by_a_different_key() {
        let identity = TestIdentity::generate();
        let impostor = TestIdentity::generate();
        let token = testing::mint_self_signed(&identity, Duration::from_secs(60));
        // Splice in the impostor's public key as the claimed subject while
        // keeping identity's signature - the signature was over the
        // original claims, so this must fail.
        let (header_b64, rest) = token.split_once('.').unwrap();
        let (_claims_b64, signature_b64) = rest.split_once('.').unwrap();
        use base64::Engine;
        let tampered_claims = IdentityClaims {
            sub: impostor.public_key().to_base64(),
            iat: Utc::now().timestamp(),
            nbf: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 60,
        };
        let tampered_claims_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&tampered_claims).unwrap());
        let tampered = format!("{header_b64}.{tampered_claims_b64}.{signature_b64}");

        let verifier = IdentityVerifier::new(AuthConfig::default());
        assert!(verifier.verify(&tampered).is_err());
    }

    #[test]
    fn rejects_an_expired_token() {
        let identity = TestIdentity::generate();
        let now = Utc::now().timestamp();
        let claims = IdentityClaims {
            sub: identity.public_key().to_base64(),
            iat: now - 120,
            nbf: now - 120,
            exp: now - 60,
        };
        let header = jsonwebtoken::Header::new(Algorithm::RS256);
        let unsigned = jsonwebtoken::encode(
            &header,
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(&[]),
        )
        .unwrap();
        let signing_input = unsigned.rsplit_once('.').unwrap().0;
        let signature = identity.sign(signing_input.as_bytes());
        use base64::Engine;
        let signature_b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(signature);
        let token = format!("{signing_input}.{signature_b64}");

        let verifier = IdentityVerifier::new(AuthConfig::default());
        assert!(matches!(verifier.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn rejects_wrong_algorithm() {
        let claims = IdentityClaims {
            sub: "irrelevant".into(),
            iat: 0,
            nbf: 0,
            exp: 0,
        };
        let header = jsonwebtoken::Header::new(Algorithm::HS256);
        let token = jsonwebtoken::encode(
            &header,
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let verifier = IdentityVerifier::new(AuthConfig::default());
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::UnsupportedAlgorithm(_))
        ));
    }
}
