//! Gateway-level HTTP error responses.
//!
//! Zone-level rejections (§4.2's `ErrorCode` list) are never translated into
//! HTTP error statuses - a validation failure is a normal, successful HTTP
//! response carrying `ZoneResponse::Failure`. This module only covers
//! failures the gateway itself produces: a missing/invalid identity token,
//! or the addressed zone's validator being unavailable (§5, §7 stratum 2).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use liquidity_auth::AuthError;
use liquidity_zone::Unavailable;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::UNAUTHORIZED);
        let response = err.to_response();
        Self {
            status,
            body: ErrorBody {
                error: response.error,
                message: response.message,
            },
        }
    }
}

/// §7 stratum 2: the addressed validator's mailbox is gone (passivated
/// mid-flight, or the process restarted). The caller's command is safe to
/// redeliver - §4.1 step 2's idempotence rule covers it - so this maps to
/// 503, not a client error.
impl From<Unavailable> for ApiError {
    fn from(_: Unavailable) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: ErrorBody {
                error: "zone_unavailable",
                message: "zone validator is not currently available; retry is safe".to_string(),
            },
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: "bad_request",
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                error: "not_found",
                message: message.into(),
            },
        }
    }
}
