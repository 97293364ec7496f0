//! # Generate
//!
//! Generate opaque identifiers for correlation tokens, service tokens,
//! and session ids.

use uuid::Uuid;

/// Generates an unguessable id for an integration-minted correlation
/// token.
#[must_use]
pub fn correlation_token() -> String {
    Uuid::new_v4().to_string()
}

/// Generates an unguessable id for a service-minted redemption token.
#[must_use]
pub fn service_token() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a fresh session id. A new id is minted on every upload
/// redemption attempt so webhook delivery can be retried safely.
#[must_use]
pub fn session_id() -> String {
    Uuid::new_v4().to_string()
}
