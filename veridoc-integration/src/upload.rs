//! # Upload Endpoint
//!
//! Core of the inbound upload webhook: the verification service pushes
//! `{session_id, correlation_token}` here after a successful document
//! check, and the pending correlation token is bound to the session id.
//! Delivery is at-least-once on the service side, so a repeated push for
//! an already bound token reports `NoPendingValue` rather than
//! overwriting the binding.

use tracing::instrument;
use veridoc_protocol::integration::{Metadata, Provider, UploadRequest, UploadResponse};
use veridoc_protocol::{Error, Result};

use crate::registry;

/// Upload webhook handler.
///
/// # Errors
///
/// Returns `InvalidRequest` when the payload is malformed and
/// `NoPendingValue` when the referenced token is not pending (absent,
/// expired, or already bound).
#[instrument(level = "debug", skip(provider))]
pub async fn upload(provider: impl Provider, request: &UploadRequest) -> Result<UploadResponse> {
    verify(request)?;
    process(provider, request).await
}

fn verify(request: &UploadRequest) -> Result<()> {
    tracing::debug!("upload::verify");

    if request.correlation_token.is_empty() {
        return Err(Error::InvalidRequest("no correlation token specified".into()));
    }
    if request.session_id.is_empty() {
        return Err(Error::InvalidRequest("no session id specified".into()));
    }
    Ok(())
}

async fn process(provider: impl Provider, request: &UploadRequest) -> Result<UploadResponse> {
    tracing::debug!("upload::process");

    let settings = Metadata::settings(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue reading settings: {e}")))?;

    registry::bind(
        &provider,
        request.flow,
        &request.correlation_token,
        &request.session_id,
        settings.pending_ttl(),
    )
    .await?;

    Ok(UploadResponse {})
}
