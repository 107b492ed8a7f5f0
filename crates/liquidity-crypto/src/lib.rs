//! RSA public-key identities for Liquidity.
//!
//! Every caller of a zone validator is identified by an RSA-2048
//! SubjectPublicKeyInfo (X.509, DER-encoded). There is no central identity
//! store: callers are self-certifying, and authorisation checks (§4.2 of the
//! spec) compare the caller's `PublicKeyDer` for byte equality against the
//! keys recorded on members and accounts.

use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Required RSA modulus size, in bits, for any key accepted by a zone.
pub const REQUIRED_KEY_SIZE_BITS: usize = 2048;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("public key is not valid DER")]
    InvalidEncoding,
    #[error("public key is not an RSA key")]
    UnsupportedKeyType,
    #[error("public key modulus is {bits} bits, expected {expected}")]
    InvalidModulusLength { bits: usize, expected: usize },
    #[error("base64 decoding failed")]
    InvalidBase64,
}

/// A validated RSA-2048 SubjectPublicKeyInfo, carried as raw DER bytes.
///
/// Construction always goes through [`PublicKeyDer::from_der`], so any value
/// of this type is known to parse as RSA with a 2048-bit modulus - the
/// `InvalidPublicKey`/`InvalidPublicKeyType`/`InvalidPublicKeyLength` checks
/// in the validation suite never need to re-derive that fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKeyDer(Vec<u8>);

impl PublicKeyDer {
    /// Parse and validate raw SubjectPublicKeyInfo DER bytes.
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        let key = RsaPublicKey::from_public_key_der(der).map_err(|_| KeyError::InvalidEncoding)?;
        let bits = key.n().bits();
        if bits != REQUIRED_KEY_SIZE_BITS {
            return Err(KeyError::InvalidModulusLength {
                bits,
                expected: REQUIRED_KEY_SIZE_BITS,
            });
        }
        Ok(Self(der.to_vec()))
    }

    /// Parse from the base64 encoding used on JSON-transported envelopes.
    pub fn from_base64(s: &str) -> Result<Self, KeyError> {
        use base64::Engine;
        let der = base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(|_| KeyError::InvalidBase64)?;
        Self::from_der(&der)
    }

    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.0)
    }

    pub fn as_der(&self) -> &[u8] {
        &self.0
    }

    /// SHA-256 fingerprint, hex-encoded - used for log lines and diagnostics
    /// so raw key material never needs to be printed.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        hex::encode(hasher.finalize())
    }

    fn to_rsa_public_key(&self) -> RsaPublicKey {
        RsaPublicKey::from_public_key_der(&self.0)
            .expect("PublicKeyDer is constructed only from validated DER")
    }
}

impl std::fmt::Display for PublicKeyDer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fingerprint())
    }
}

impl Serialize for PublicKeyDer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PublicKeyDer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// Verify an RSASSA-PKCS1-v1_5/SHA-256 signature made by the holder of a
/// [`PublicKeyDer`]. Used by the gateway to check that a caller presenting a
/// self-asserted JWT really holds the private key behind the claimed public
/// key (see `liquidity-auth`).
pub fn verify_sha256_signature(
    key: &PublicKeyDer,
    message: &[u8],
    signature: &[u8],
) -> Result<(), KeyError> {
    use rsa::pkcs1v15::VerifyingKey;
    use rsa::signature::Verifier;

    let public_key = key.to_rsa_public_key();
    let verifying_key: VerifyingKey<Sha256> = VerifyingKey::new(public_key);
    let signature = rsa::pkcs1v15::Signature::try_from(signature)
        .map_err(|_| KeyError::InvalidEncoding)?;
    verifying_key
        .verify(message, &signature)
        .map_err(|_| KeyError::InvalidEncoding)
}

/// Test-only helpers for generating real RSA-2048 identities without
/// reaching outside this crate. Kept in the main build (not `cfg(test)`) so
/// downstream crates (`liquidity-auth`, `liquidity-zone`, the gateway's
/// integration tests) can use it too.
pub mod testing {
    use super::*;
    use rsa::pkcs1v15::SigningKey;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::signature::{RandomizedSigner, SignatureEncoding};
    use rsa::RsaPrivateKey;

    /// A generated RSA-2048 keypair for use in tests and the demo binary.
    pub struct TestIdentity {
        private_key: RsaPrivateKey,
        public_key_der: PublicKeyDer,
    }

    impl TestIdentity {
        pub fn generate() -> Self {
            let mut rng = rand::thread_rng();
            let private_key =
                RsaPrivateKey::new(&mut rng, REQUIRED_KEY_SIZE_BITS).expect("key generation");
            let der = private_key
                .to_public_key()
                .to_public_key_der()
                .expect("encode SPKI")
                .as_bytes()
                .to_vec();
            let public_key_der = PublicKeyDer::from_der(&der).expect("freshly generated key is valid");
            Self {
                private_key,
                public_key_der,
            }
        }

        pub fn public_key(&self) -> &PublicKeyDer {
            &self.public_key_der
        }

        pub fn sign(&self, message: &[u8]) -> Vec<u8> {
            let signing_key: SigningKey<Sha256> = SigningKey::new(self.private_key.clone());
            let mut rng = rand::thread_rng();
            signing_key.sign_with_rng(&mut rng, message).to_vec()
        }
    }
}
