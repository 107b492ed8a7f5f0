//! The `Authenticated` extractor: pulls the caller's identity token out of
//! the `Authorization` header and verifies it against `AppState::verifier`
//! (§6 "Authentication: RSA-signed JWT whose subject is the base64-encoded
//! public key").

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use liquidity_auth::IdentityVerifier;
use liquidity_crypto::PublicKeyDer;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller's verified public key, extracted from a bearer token.
pub struct Authenticated(pub PublicKeyDer);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::bad_request("missing or malformed bearer token"))?;
        let app_state = Arc::<AppState>::from_ref(state);
        let verifier: &IdentityVerifier = &app_state.verifier;
        let public_key = verifier.verify(&token)?;
        Ok(Authenticated(public_key))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    header.strip_prefix("Bearer ").map(str::to_string)
}
