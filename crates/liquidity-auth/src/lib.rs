//! Identity verification for the Liquidity gateway.
//!
//! Callers are self-certifying: a request's bearer token is an RS256 JWT
//! whose `sub` claim is the base64 of the caller's own RSA-2048 public key,
//! signed by the matching private key. There is no login flow, no
//! server-held signing secret, and no session/password/2FA/API-key surface
//! to maintain - `IdentityVerifier::verify` either returns the caller's
//! [`liquidity_crypto::PublicKeyDer`] or a reason it couldn't, and the
//! gateway passes that key straight through to the zone validator, which is
//! the only place authorization decisions (is this key a member, does it own
//! this account) are actually made.

pub mod config;
pub mod error;
pub mod jwt;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use jwt::IdentityVerifier;
