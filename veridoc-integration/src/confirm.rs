//! # Reset Confirmation Endpoint
//!
//! Core of the inbound reset-confirmation webhook. The reset flow's
//! correlation token is minted here, once the verification service
//! reports that the end user followed the e-mailed confirmation link,
//! rather than at init time. This keeps the double opt-in visible: no
//! reset can progress until the confirmation arrives.

use tracing::instrument;
use veridoc_core::gen;
use veridoc_protocol::integration::{
    Metadata, Provider, ResetConfirmationRequest, ResetConfirmationResponse,
};
use veridoc_protocol::{Error, FlowKind, Result};

use crate::registry;

/// Reset-confirmation webhook handler.
///
/// # Errors
///
/// Returns `ServerError` when the pending token cannot be created; the
/// service treats that as a failed confirmation and the end user retries
/// from the e-mailed link.
#[instrument(level = "debug", skip(provider))]
pub async fn reset_confirmation(
    provider: impl Provider, _request: &ResetConfirmationRequest,
) -> Result<ResetConfirmationResponse> {
    process(provider).await
}

async fn process(provider: impl Provider) -> Result<ResetConfirmationResponse> {
    tracing::debug!("reset_confirmation::process");

    let settings = Metadata::settings(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue reading settings: {e}")))?;

    let correlation_token = gen::correlation_token();
    registry::create_pending(&provider, FlowKind::Reset, &correlation_token, settings.pending_ttl())
        .await?;

    Ok(ResetConfirmationResponse { correlation_token })
}
