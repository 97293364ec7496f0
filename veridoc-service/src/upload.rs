//! # Upload Endpoints
//!
//! The verification gate. Each upload redeems a service token, runs the
//! document check, pushes the outcome to the integration's webhook, and
//! deletes the token. Step order matters: the token is deleted only after
//! webhook delivery succeeds, so a failed delivery leaves the token
//! redeemable within its TTL window and the browser can simply retry. A
//! fresh session id is minted per attempt, which keeps retries safe under
//! the gateway's at-least-once delivery.

use tracing::instrument;
use veridoc_core::gen;
use veridoc_protocol::provider::StateStore;
use veridoc_protocol::service::{
    DocumentCheck, Gateway, Integration, Metadata, Provider, RegisterUploadRequest,
    RegisterUploadResponse, ResetUploadRequest, ResetUploadResponse, RestoreUploadRequest,
    RestoreUploadResponse, Subject, SubjectRecord, UploadCallback,
};
use veridoc_protocol::{Error, FlowKind, Result, StateKey};

/// Register upload handler: verifies the document, records its id on the
/// subject, and notifies the integration.
///
/// # Errors
///
/// Returns `InvalidRequest` when the request is malformed, `NotFound`
/// when the service token is absent or expired, `UnprocessableDocument`
/// when the document check fails (retryable), and `Unavailable` when the
/// webhook cannot be delivered (retryable; the token is not consumed).
#[instrument(level = "debug", skip(provider, request))]
pub async fn register_upload(
    provider: impl Provider, request: &RegisterUploadRequest,
) -> Result<RegisterUploadResponse> {
    verify(&request.service_token, &request.base64_image)?;
    if request.correlation_token.is_empty() {
        return Err(Error::InvalidRequest("no correlation token specified".into()));
    }

    tracing::debug!("register_upload::process");

    let (subject, integration) = resolve(&provider, FlowKind::Register, &request.service_token).await?;
    let document_id = check_document(&provider, &request.base64_image).await?;

    Subject::set_document(&provider, &subject.id, &document_id)
        .await
        .map_err(|e| Error::ServerError(format!("issue saving document id: {e}")))?;

    let session_id = gen::session_id();
    deliver(
        &provider,
        &integration.register_webhook,
        &UploadCallback {
            session_id,
            correlation_token: request.correlation_token.clone(),
        },
    )
    .await?;

    consume(&provider, FlowKind::Register, &request.service_token).await?;

    Ok(RegisterUploadResponse {})
}

/// Restore upload handler: the uploaded document must be the one verified
/// at registration.
///
/// # Errors
///
/// As [`register_upload`], plus `Forbidden` when the detected document id
/// does not match the subject's stored one. In that case no webhook is
/// delivered and the token is not consumed.
#[instrument(level = "debug", skip(provider, request))]
pub async fn restore_upload(
    provider: impl Provider, request: &RestoreUploadRequest,
) -> Result<RestoreUploadResponse> {
    verify(&request.service_token, &request.base64_image)?;
    if request.correlation_token.is_empty() {
        return Err(Error::InvalidRequest("no correlation token specified".into()));
    }

    tracing::debug!("restore_upload::process");

    let (subject, integration) = resolve(&provider, FlowKind::Restore, &request.service_token).await?;
    let document_id = check_document(&provider, &request.base64_image).await?;

    if subject.document_id.as_deref() != Some(document_id.as_str()) {
        return Err(Error::Forbidden("wrong document".into()));
    }

    let session_id = gen::session_id();
    deliver(
        &provider,
        &integration.restore_webhook,
        &UploadCallback {
            session_id,
            correlation_token: request.correlation_token.clone(),
        },
    )
    .await?;

    consume(&provider, FlowKind::Restore, &request.service_token).await?;

    Ok(RestoreUploadResponse {})
}

/// Reset upload handler. The correlation token is not in the request: the
/// integration minted it at confirmation time and it is resolved from the
/// reset claim stored then. It is returned to the browser, which needs it
/// for session setup.
///
/// # Errors
///
/// As [`register_upload`]; `NotFound` also covers a missing reset claim
/// (the confirmation hop never happened or has expired).
#[instrument(level = "debug", skip(provider, request))]
pub async fn reset_upload(
    provider: impl Provider, request: &ResetUploadRequest,
) -> Result<ResetUploadResponse> {
    verify(&request.service_token, &request.base64_image)?;

    tracing::debug!("reset_upload::process");

    let (subject, integration) = resolve(&provider, FlowKind::Reset, &request.service_token).await?;

    let claim_key = StateKey::reset_claim(subject.id.as_str());
    let Some(correlation_token) = provider
        .get(&claim_key)
        .await
        .map_err(|e| Error::ServerError(format!("issue reading reset claim: {e}")))?
    else {
        return Err(Error::NotFound("subject not found".into()));
    };

    let document_id = check_document(&provider, &request.base64_image).await?;
    Subject::set_document(&provider, &subject.id, &document_id)
        .await
        .map_err(|e| Error::ServerError(format!("issue saving document id: {e}")))?;

    let session_id = gen::session_id();
    deliver(
        &provider,
        &integration.reset_credentials_webhook,
        &UploadCallback {
            session_id,
            correlation_token: correlation_token.clone(),
        },
    )
    .await?;

    consume(&provider, FlowKind::Reset, &request.service_token).await?;
    provider
        .purge(&claim_key)
        .await
        .map_err(|e| Error::ServerError(format!("issue consuming reset claim: {e}")))?;

    Ok(ResetUploadResponse { correlation_token })
}

fn verify(service_token: &str, base64_image: &str) -> Result<()> {
    tracing::debug!("upload::verify");

    if service_token.is_empty() {
        return Err(Error::InvalidRequest("no service token specified".into()));
    }
    if base64_image.is_empty() {
        return Err(Error::InvalidRequest("no document image specified".into()));
    }
    Ok(())
}

/// Resolve a service token to its subject and integration records.
pub(crate) async fn resolve(
    provider: &impl Provider, flow: FlowKind, service_token: &str,
) -> Result<(SubjectRecord, Integration)> {
    let key = StateKey::token(flow, service_token);
    let Some(subject_id) = provider
        .get(&key)
        .await
        .map_err(|e| Error::ServerError(format!("issue reading token: {e}")))?
    else {
        return Err(Error::NotFound("subject not found".into()));
    };

    let subject = Subject::find(provider, &subject_id)
        .await
        .map_err(|e| Error::ServerError(format!("issue finding subject: {e}")))?;
    let Some(subject) = subject else {
        return Err(Error::NotFound("subject not found".into()));
    };

    let integration = Metadata::integration(provider, &subject.integration_id)
        .await
        .map_err(|e| Error::ServerError(format!("issue finding integration: {e}")))?;

    Ok((subject, integration))
}

async fn check_document(provider: &impl Provider, base64_image: &str) -> Result<String> {
    DocumentCheck::document_id(provider, base64_image).await.map_err(|e| {
        tracing::debug!("document check failed: {e}");
        Error::UnprocessableDocument("could not get the document id".into())
    })
}

async fn deliver(provider: &impl Provider, url: &str, payload: &UploadCallback) -> Result<()> {
    Gateway::upload_callback(provider, url, payload).await.map_err(|e| {
        tracing::error!("issue delivering webhook: {e}");
        Error::Unavailable("integration webhook unavailable".into())
    })
}

async fn consume(provider: &impl Provider, flow: FlowKind, service_token: &str) -> Result<()> {
    provider
        .purge(&StateKey::token(flow, service_token))
        .await
        .map_err(|e| Error::ServerError(format!("issue consuming token: {e}")))
}
