//! Errors produced while verifying a caller's self-asserted identity token.

use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header is missing or malformed")]
    MissingToken,

    #[error("token header or claims could not be decoded: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error("token alg {0} is not supported, expected RS256")]
    UnsupportedAlgorithm(String),

    #[error("token subject is not a valid public key: {0}")]
    InvalidPublicKey(#[from] liquidity_crypto::KeyError),

    #[error("token signature does not match the public key in its subject claim")]
    SignatureMismatch,

    #[error("token is expired")]
    Expired,

    #[error("token is not yet valid")]
    NotYetValid,

    #[error("token lifetime of {0}s exceeds the maximum allowed")]
    LifetimeTooLong(i64),
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingToken => 401,
            AuthError::Malformed(_) => 401,
            AuthError::UnsupportedAlgorithm(_) => 401,
            AuthError::InvalidPublicKey(_) => 401,
            AuthError::SignatureMismatch => 401,
            AuthError::Expired => 401,
            AuthError::NotYetValid => 401,
            AuthError::LifetimeTooLong(_) => 400,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::Malformed(_) => "malformed_token",
            AuthError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            AuthError::InvalidPublicKey(_) => "invalid_public_key",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::Expired => "token_expired",
            AuthError::NotYetValid => "token_not_yet_valid",
            AuthError::LifetimeTooLong(_) => "token_lifetime_too_long",
        }
    }

    /// Message safe to return to the caller - none of the variants here leak
    /// anything beyond what the caller already supplied as their own token.
    pub fn client_message(&self) -> String {
        self.to_string()
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_code(),
            message: self.client_message(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}
