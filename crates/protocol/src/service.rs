//! # Service Role
//!
//! Request/response types and provider traits for the verification
//! service: flow-init token minting, upload redemption, and reset
//! confirmation.

use std::future::Future;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::provider::{self, StateStore};

/// Verification-service provider trait.
pub trait Provider:
    Metadata + Subject + DocumentCheck + Gateway + Courier + StateStore + Clone
{
}

/// The `Metadata` trait supplies service settings and integration
/// records.
pub trait Metadata: Send + Sync {
    /// Returns the service's settings.
    fn settings(&self) -> impl Future<Output = provider::Result<Settings>> + Send;

    /// Returns the integration registered under `integration_id`.
    fn integration(
        &self, integration_id: &str,
    ) -> impl Future<Output = provider::Result<Integration>> + Send;
}

/// Deployment settings recognized by the service endpoints.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Public base URL used to mint upload and confirmation URLs.
    pub service_host: String,

    /// Seconds a service token may live before redemption.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

impl Settings {
    /// TTL applied to service and confirm tokens.
    #[must_use]
    pub fn token_ttl(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.token_ttl_secs).unwrap_or_default()
    }
}

const fn default_token_ttl() -> i64 {
    600
}

/// An integration registered with the verification service. The webhooks
/// are integration-owned URLs the service pushes flow results to.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Integration {
    /// Registry identifier.
    pub id: String,

    /// Webhook receiving register upload results.
    pub register_webhook: String,

    /// Webhook receiving restore upload results.
    pub restore_webhook: String,

    /// Webhook consulted to obtain a reset correlation token.
    pub reset_confirmation_webhook: String,

    /// Webhook receiving reset upload results.
    pub reset_credentials_webhook: String,

    /// Integration-owned page the browser is redirected to after reset
    /// confirmation.
    pub reset_upload_page: String,
}

/// A subject (end user) known to the verification service.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubjectRecord {
    /// Registry identifier.
    pub id: String,

    /// The integration the subject belongs to.
    pub integration_id: String,

    /// E-mail the subject registered with.
    pub email: String,

    /// Document number verified at registration, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// The `Subject` trait specifies how the service expects subject records
/// to be provided. Backed by relational storage in deployments.
pub trait Subject: Send + Sync {
    /// Create a subject for `integration_id` with no verified document
    /// yet. Returns the new subject id.
    fn create(
        &self, integration_id: &str, email: &str,
    ) -> impl Future<Output = provider::Result<String>> + Send;

    /// Find a subject by e-mail within an integration.
    fn find_by_email(
        &self, integration_id: &str, email: &str,
    ) -> impl Future<Output = provider::Result<Option<SubjectRecord>>> + Send;

    /// Find a subject by id.
    fn find(
        &self, subject_id: &str,
    ) -> impl Future<Output = provider::Result<Option<SubjectRecord>>> + Send;

    /// Record the verified document id on the subject.
    fn set_document(
        &self, subject_id: &str, document_id: &str,
    ) -> impl Future<Output = provider::Result<()>> + Send;
}

/// The `DocumentCheck` trait wraps identity-document verification. OCR
/// and document text parsing live behind it.
pub trait DocumentCheck: Send + Sync {
    /// Extract the document id from an uploaded image. An error means the
    /// document could not be processed; callers treat it as retryable.
    fn document_id(
        &self, base64_image: &str,
    ) -> impl Future<Output = provider::Result<String>> + Send;
}

/// The `Gateway` trait delivers outbound webhooks to integration-owned
/// URLs.
///
/// Delivery is at-least-once: a delivery reported as failed may still
/// have been received. Callers stay idempotent by minting a fresh session
/// id per attempt and consuming tokens only after a reported success.
pub trait Gateway: Send + Sync {
    /// Push an upload result to the integration.
    fn upload_callback(
        &self, url: &str, payload: &UploadCallback,
    ) -> impl Future<Output = provider::Result<()>> + Send;

    /// Ask the integration for a reset correlation token.
    fn reset_confirmation(&self, url: &str)
        -> impl Future<Output = provider::Result<String>> + Send;
}

/// Payload pushed to an integration's upload webhook.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct UploadCallback {
    /// Session id minted for this upload attempt.
    pub session_id: String,

    /// Correlation token identifying the flow on the integration side.
    pub correlation_token: String,
}

/// The `Courier` trait sends the reset confirmation e-mail.
pub trait Courier: Send + Sync {
    /// Send `confirm_url` to `email` for double opt-in.
    fn send_confirmation(
        &self, email: &str, confirm_url: &str,
    ) -> impl Future<Output = provider::Result<()>> + Send;
}

/// Request to start a register flow for a new subject.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InitRegisterRequest {
    /// The authenticated integration, as resolved by the routing layer.
    pub integration_id: String,

    /// E-mail of the user being registered.
    pub email: String,
}

/// The response to a register init request.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InitRegisterResponse {
    /// Single-redemption token the browser presents at upload time.
    pub service_token: String,

    /// Where the browser should upload the identity document.
    pub upload_url: String,
}

/// Request to start a restore flow for an existing subject.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InitRestoreRequest {
    /// The authenticated integration, as resolved by the routing layer.
    pub integration_id: String,

    /// E-mail of the user restoring access.
    pub email: String,
}

/// The response to a restore init request.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InitRestoreResponse {
    /// Single-redemption token the browser presents at upload time.
    pub service_token: String,

    /// Where the browser should upload the identity document.
    pub upload_url: String,
}

/// Request to start a reset flow for an existing subject.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InitResetRequest {
    /// The authenticated integration, as resolved by the routing layer.
    pub integration_id: String,

    /// E-mail the confirmation link is sent to.
    pub email: String,
}

/// The response to a reset init request. No token is returned to the
/// integration directly; the browser receives it via the e-mailed
/// confirmation link.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InitResetResponse {
    /// Where the browser should upload the identity document.
    pub upload_url: String,
}

/// Browser upload for the register flow.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RegisterUploadRequest {
    /// The redemption token handed out at init time.
    pub service_token: String,

    /// The correlation token handed to the browser at init time.
    pub correlation_token: String,

    /// The identity document image.
    pub base64_image: String,
}

/// The response to a register upload.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RegisterUploadResponse {}

/// Browser upload for the restore flow.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RestoreUploadRequest {
    /// The redemption token handed out at init time.
    pub service_token: String,

    /// The correlation token handed to the browser at init time.
    pub correlation_token: String,

    /// The identity document image.
    pub base64_image: String,
}

/// The response to a restore upload.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RestoreUploadResponse {}

/// Browser upload for the reset flow. No correlation token: it was minted
/// by the integration at confirmation time and is resolved from the reset
/// claim.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResetUploadRequest {
    /// The confirm token carried through from the e-mailed link.
    pub service_token: String,

    /// The identity document image.
    pub base64_image: String,
}

/// The response to a reset upload.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResetUploadResponse {
    /// The integration-minted correlation token the browser needs for
    /// session setup.
    pub correlation_token: String,
}

/// Browser request following the e-mailed reset confirmation link.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConfirmResetRequest {
    /// Confirm token from the e-mailed link.
    pub confirm_token: String,
}

/// The response to a reset confirmation.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConfirmResetResponse {
    /// Integration upload page the browser should be redirected to, with
    /// the confirm token attached.
    pub redirect_url: String,
}
