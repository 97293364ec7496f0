//! # Integration Role
//!
//! Request/response types and provider traits for the integration side of
//! the hand-off: flow initiation, webhook binding, and session setup.

use std::future::Future;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::provider::{self, StateStore};
use crate::FlowKind;

/// Integration-side provider trait.
pub trait Provider: Metadata + ServiceClient + StateStore + Clone {}

/// The `Metadata` trait supplies the integration's deployment settings.
pub trait Metadata: Send + Sync {
    /// Returns the integration's settings.
    fn settings(&self) -> impl Future<Output = provider::Result<Settings>> + Send;
}

/// Deployment settings recognized by the integration endpoints.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Seconds a flow token may remain pending, and the lifetime re-armed
    /// when it is bound.
    #[serde(default = "default_pending_ttl")]
    pub pending_ttl_secs: i64,

    /// Seconds a session record lives.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pending_ttl_secs: default_pending_ttl(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

impl Settings {
    /// TTL applied to pending and freshly bound flow tokens.
    #[must_use]
    pub fn pending_ttl(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.pending_ttl_secs).unwrap_or_default()
    }

    /// TTL applied to session records.
    #[must_use]
    pub fn session_ttl(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.session_ttl_secs).unwrap_or_default()
    }
}

const fn default_pending_ttl() -> i64 {
    600
}

const fn default_session_ttl() -> i64 {
    5_184_000
}

/// `ServiceClient` lets the orchestrators reach the verification
/// service's init endpoints. Deployments speak HTTP+JSON; the trait keeps
/// the orchestrators transport agnostic.
pub trait ServiceClient: Send + Sync {
    /// Ask the service to create a subject and mint a register token.
    fn init_register(&self, email: &str) -> impl Future<Output = provider::Result<TokenGrant>> + Send;

    /// Ask the service to mint a restore token for an existing subject.
    fn init_restore(&self, email: &str) -> impl Future<Output = provider::Result<TokenGrant>> + Send;

    /// Ask the service to start the e-mail confirmed reset flow. Returns
    /// the upload URL.
    fn init_reset(&self, email: &str) -> impl Future<Output = provider::Result<String>> + Send;
}

/// A service token grant returned by the verification service at
/// flow-init time.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TokenGrant {
    /// Single-redemption token the browser presents at upload time.
    pub service_token: String,

    /// Where the browser should upload the identity document.
    pub upload_url: String,
}

/// Request to initiate a verification flow for an end user.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InitRequest {
    /// The flow to initiate.
    pub flow: FlowKind,

    /// E-mail of the end user the flow concerns.
    pub email: String,
}

/// The response to a flow init request. Everything in it is forwarded to
/// the end user's browser.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InitResponse {
    /// Where the browser should upload the identity document.
    pub upload_url: String,

    /// Service-minted redemption token. Not returned for reset: the
    /// browser receives its token through the confirmation e-mail hop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,

    /// Correlation token tracking the flow. Not returned for reset: it is
    /// minted at confirmation time instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_token: Option<String>,
}

/// Inbound upload-webhook payload: binds `session_id` to the pending flow
/// token.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UploadRequest {
    /// The flow being bound.
    pub flow: FlowKind,

    /// Correlation token handed to the browser at init time.
    pub correlation_token: String,

    /// Session id generated by the verification gate at upload time.
    pub session_id: String,
}

/// The response to a successful upload bind.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UploadResponse {}

/// Inbound reset-confirmation webhook. The body is empty: the service
/// only needs a fresh correlation token back.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResetConfirmationRequest {}

/// The response carrying the correlation token minted for a confirmed
/// reset.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResetConfirmationResponse {
    /// Correlation token created pending for the reset flow.
    pub correlation_token: String,
}

/// Request to exchange a bound flow token for a durable session.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SetupSessionRequest {
    /// The flow the token belongs to.
    pub flow: FlowKind,

    /// The subject the session is created for.
    pub subject_id: String,

    /// The flow token to consume.
    pub correlation_token: String,
}

/// The response to a session setup request.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SetupSessionResponse {
    /// The session id bound into the flow token at upload time.
    pub session_id: String,

    /// Session lifetime in milliseconds, as consumed by browser cookie
    /// APIs.
    pub max_age: i64,
}

/// Session lookup for an authenticated request.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ReadSessionRequest {
    /// The session to look up.
    pub session_id: String,
}

/// The response to a session lookup.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ReadSessionResponse {
    /// The subject the session belongs to, when the session exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
}

/// Logout request.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DeleteSessionRequest {
    /// The session to delete.
    pub session_id: String,
}

/// The response to a logout request.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DeleteSessionResponse {}
