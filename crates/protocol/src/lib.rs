//! # Veridoc Hand-off Protocol Types
//!
//! Types and logic used in the three-party verification hand-off and
//! consumed by the `veridoc-integration` and `veridoc-service` crates.
//!
//! The crate is for internal use within the Veridoc project and is not
//! intended to be used directly by end users. Public types are
//! re-exported through the respective top-level `veridoc-xxx` crates.

mod error;
pub mod integration;
pub mod provider;
pub mod service;

use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub use self::error::Error;

/// Result type for protocol endpoints.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The three verification flows. Each is a three-phase hand-off between
/// the integration, the verification service, and the end user's browser,
/// differing only in how the subject record is resolved and which webhook
/// receives the outcome.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    /// First-time registration: a subject record is created at init and
    /// its identity document verified at upload.
    #[default]
    Register,

    /// Restore access for an existing subject. The uploaded document must
    /// match the one verified at registration.
    Restore,

    /// Reset credentials. Requires an e-mail confirmation hop before the
    /// upload, so the correlation token is integration-minted rather than
    /// request-minted.
    Reset,
}

impl Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register => write!(f, "register"),
            Self::Restore => write!(f, "restore"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// Typed constructor for state-store keys.
///
/// Every store access goes through a tagged key, so a token minted for
/// one flow can never be read back through another and key text is
/// assembled in exactly one place.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// A correlation or redemption token, namespaced by flow.
    Token(FlowKind, String),

    /// A durable session record.
    Session(String),

    /// A reset correlation claim, keyed by the subject awaiting upload.
    ResetClaim(String),
}

impl StateKey {
    /// Key for a flow-namespaced token.
    #[must_use]
    pub fn token(flow: FlowKind, id: impl Into<String>) -> Self {
        Self::Token(flow, id.into())
    }

    /// Key for a session record.
    #[must_use]
    pub fn session(id: impl Into<String>) -> Self {
        Self::Session(id.into())
    }

    /// Key for a reset correlation claim.
    #[must_use]
    pub fn reset_claim(subject_id: impl Into<String>) -> Self {
        Self::ResetClaim(subject_id.into())
    }
}

impl Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(flow, id) => write!(f, "{flow}:{id}"),
            Self::Session(id) => write!(f, "session:{id}"),
            Self::ResetClaim(subject_id) => write!(f, "reset:claim:{subject_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_text() {
        let key = StateKey::token(FlowKind::Register, "abc");
        assert_eq!(key.to_string(), "register:abc");

        let key = StateKey::session("sess-123");
        assert_eq!(key.to_string(), "session:sess-123");

        let key = StateKey::reset_claim("subject-1");
        assert_eq!(key.to_string(), "reset:claim:subject-1");
    }

    // A reset token and a reset claim for the same id must not collide.
    #[test]
    fn no_cross_namespace_collision() {
        let token = StateKey::token(FlowKind::Reset, "x");
        let claim = StateKey::reset_claim("x");
        assert_ne!(token.to_string(), claim.to_string());
    }

    #[test]
    fn flow_kind_serde() {
        let flow: FlowKind = serde_json::from_str(r#""restore""#).expect("should deserialize");
        assert_eq!(flow, FlowKind::Restore);
        assert_eq!(serde_json::to_string(&FlowKind::Reset).expect("should serialize"), r#""reset""#);
    }
}
