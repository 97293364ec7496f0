//! # Init Endpoints
//!
//! Flow-init endpoints called by integration backends. Each resolves or
//! creates the subject record, mints a single-redemption token with a
//! short TTL, and returns the upload URL the integration forwards to the
//! end user's browser.

use chrono::Utc;
use tracing::instrument;
use veridoc_core::gen;
use veridoc_protocol::provider::StateStore;
use veridoc_protocol::service::{
    Courier, InitRegisterRequest, InitRegisterResponse, InitResetRequest, InitResetResponse,
    InitRestoreRequest, InitRestoreResponse, Metadata, Provider, Settings, Subject,
};
use veridoc_protocol::{Error, FlowKind, Result, StateKey};

/// Register init handler: creates the subject record and mints its
/// redemption token.
///
/// # Errors
///
/// Returns `InvalidRequest` when the request is malformed and
/// `ServerError` when a collaborator fails.
#[instrument(level = "debug", skip(provider))]
pub async fn init_register(
    provider: impl Provider, request: &InitRegisterRequest,
) -> Result<InitRegisterResponse> {
    verify(&request.integration_id, &request.email)?;

    tracing::debug!("init_register::process");

    let settings = settings(&provider).await?;
    let subject_id = Subject::create(&provider, &request.integration_id, &request.email)
        .await
        .map_err(|e| Error::ServerError(format!("issue creating subject: {e}")))?;

    let service_token = mint_token(&provider, &settings, FlowKind::Register, &subject_id).await?;

    Ok(InitRegisterResponse {
        service_token,
        upload_url: upload_url(&settings, FlowKind::Register),
    })
}

/// Restore init handler: mints a redemption token for an existing
/// subject.
///
/// # Errors
///
/// Returns `InvalidRequest` when the request is malformed, `NotFound`
/// when no subject matches the e-mail, and `ServerError` when a
/// collaborator fails.
#[instrument(level = "debug", skip(provider))]
pub async fn init_restore(
    provider: impl Provider, request: &InitRestoreRequest,
) -> Result<InitRestoreResponse> {
    verify(&request.integration_id, &request.email)?;

    tracing::debug!("init_restore::process");

    let settings = settings(&provider).await?;
    let subject = find_subject(&provider, &request.integration_id, &request.email).await?;

    let service_token = mint_token(&provider, &settings, FlowKind::Restore, &subject.id).await?;

    Ok(InitRestoreResponse {
        service_token,
        upload_url: upload_url(&settings, FlowKind::Restore),
    })
}

/// Reset init handler: mints a confirm token and e-mails the confirmation
/// link. No token is returned to the integration; the browser picks it up
/// from the link.
///
/// # Errors
///
/// Returns `InvalidRequest` when the request is malformed, `NotFound`
/// when no subject matches the e-mail, `Unavailable` when the
/// confirmation e-mail cannot be sent, and `ServerError` when a
/// collaborator fails.
#[instrument(level = "debug", skip(provider))]
pub async fn init_reset(
    provider: impl Provider, request: &InitResetRequest,
) -> Result<InitResetResponse> {
    verify(&request.integration_id, &request.email)?;

    tracing::debug!("init_reset::process");

    let settings = settings(&provider).await?;
    let subject = find_subject(&provider, &request.integration_id, &request.email).await?;

    let confirm_token = mint_token(&provider, &settings, FlowKind::Reset, &subject.id).await?;

    let confirm_url = format!("{}/reset/confirm?token={confirm_token}", settings.service_host);
    Courier::send_confirmation(&provider, &request.email, &confirm_url).await.map_err(|e| {
        tracing::error!("issue sending confirmation: {e}");
        Error::Unavailable("confirmation e-mail could not be sent".into())
    })?;

    Ok(InitResetResponse {
        upload_url: upload_url(&settings, FlowKind::Reset),
    })
}

// Requests share a shape; so does their validation.
fn verify(integration_id: &str, email: &str) -> Result<()> {
    tracing::debug!("init::verify");

    if integration_id.is_empty() {
        return Err(Error::InvalidRequest("no integration specified".into()));
    }
    if email.is_empty() {
        return Err(Error::InvalidRequest("no email specified".into()));
    }
    Ok(())
}

async fn settings(provider: &impl Provider) -> Result<Settings> {
    Metadata::settings(provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue reading settings: {e}")))
}

async fn find_subject(
    provider: &impl Provider, integration_id: &str, email: &str,
) -> Result<veridoc_protocol::service::SubjectRecord> {
    let subject = Subject::find_by_email(provider, integration_id, email)
        .await
        .map_err(|e| Error::ServerError(format!("issue finding subject: {e}")))?;
    subject.ok_or_else(|| Error::NotFound("subject not found".into()))
}

// Mint a redemption token resolving to `subject_id`.
async fn mint_token(
    provider: &impl Provider, settings: &Settings, flow: FlowKind, subject_id: &str,
) -> Result<String> {
    let service_token = gen::service_token();
    provider
        .put(
            &StateKey::token(flow, service_token.as_str()),
            subject_id,
            Utc::now() + settings.token_ttl(),
        )
        .await
        .map_err(|e| Error::ServerError(format!("issue saving token: {e}")))?;
    Ok(service_token)
}

fn upload_url(settings: &Settings, flow: FlowKind) -> String {
    format!("{}/upload/{flow}", settings.service_host)
}
