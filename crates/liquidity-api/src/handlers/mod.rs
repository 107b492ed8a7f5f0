//! Request handlers for the gateway's HTTP/WebSocket surface (§6).

pub mod diagnostics;
pub mod health;
pub mod zone;
