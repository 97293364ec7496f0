//! # Confirm Endpoint
//!
//! Browser-facing reset confirmation, reached from the e-mailed link.
//! This extra hop exists because the reset correlation token is
//! integration-minted: the integration hands one out over its
//! confirmation webhook, so no reset can progress without the end user
//! acting on the e-mail. The confirm token itself stays live; the upload
//! step redeems it.

use chrono::Utc;
use tracing::instrument;
use veridoc_protocol::provider::StateStore;
use veridoc_protocol::service::{
    ConfirmResetRequest, ConfirmResetResponse, Gateway, Metadata, Provider,
};
use veridoc_protocol::{Error, FlowKind, Result, StateKey};

use crate::upload::resolve;

/// Reset confirmation handler.
///
/// # Errors
///
/// Returns `InvalidRequest` when the request is malformed, `NotFound`
/// when the confirm token is absent or expired, and `Unavailable` when
/// the integration's confirmation webhook cannot be reached.
#[instrument(level = "debug", skip(provider))]
pub async fn confirm_reset(
    provider: impl Provider, request: &ConfirmResetRequest,
) -> Result<ConfirmResetResponse> {
    verify(request)?;
    process(provider, request).await
}

fn verify(request: &ConfirmResetRequest) -> Result<()> {
    tracing::debug!("confirm_reset::verify");

    if request.confirm_token.is_empty() {
        return Err(Error::InvalidRequest("no confirm token specified".into()));
    }
    Ok(())
}

async fn process(
    provider: impl Provider, request: &ConfirmResetRequest,
) -> Result<ConfirmResetResponse> {
    tracing::debug!("confirm_reset::process");

    let (subject, integration) = resolve(&provider, FlowKind::Reset, &request.confirm_token).await?;

    let correlation_token =
        Gateway::reset_confirmation(&provider, &integration.reset_confirmation_webhook)
            .await
            .map_err(|e| {
                tracing::error!("issue fetching reset correlation token: {e}");
                Error::Unavailable("integration webhook unavailable".into())
            })?;

    let settings = Metadata::settings(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue reading settings: {e}")))?;

    provider
        .put(
            &StateKey::reset_claim(subject.id.as_str()),
            &correlation_token,
            Utc::now() + settings.token_ttl(),
        )
        .await
        .map_err(|e| Error::ServerError(format!("issue saving reset claim: {e}")))?;

    Ok(ConfirmResetResponse {
        redirect_url: format!("{}?token={}", integration.reset_upload_page, request.confirm_token),
    })
}

#[cfg(test)]
mod tests {
    use veridoc_protocol::service::{InitResetRequest, SubjectRecord};
    use veridoc_test_utils::service::Provider;
    use veridoc_test_utils::INTEGRATION_ID;

    use super::*;
    use crate::init::init_reset;

    async fn confirm_token(provider: &Provider) -> String {
        provider.subjects.add(SubjectRecord {
            id: "subject-1".into(),
            integration_id: INTEGRATION_ID.into(),
            email: "a@b.com".into(),
            document_id: Some("120398450983".into()),
        });
        let request = InitResetRequest {
            integration_id: INTEGRATION_ID.into(),
            email: "a@b.com".into(),
        };
        init_reset(provider.clone(), &request).await.expect("response is ok");

        let sent = provider.courier.sent();
        sent[0].1.split("token=").nth(1).expect("link carries the token").to_string()
    }

    #[tokio::test]
    async fn claim_stored_and_redirected() {
        veridoc_test_utils::init_tracer();

        let provider = Provider::new();
        let confirm_token = confirm_token(&provider).await;
        provider.gateway.set_reset_correlation("corr-reset-1");

        let request = ConfirmResetRequest {
            confirm_token: confirm_token.clone(),
        };
        let response = confirm_reset(provider.clone(), &request).await.expect("response is ok");
        assert_eq!(
            response.redirect_url,
            format!("{}?token={confirm_token}", provider.integration.reset_upload_page)
        );

        // the integration-minted token is claimable by the upload step
        let claim = provider
            .get(&StateKey::reset_claim("subject-1"))
            .await
            .expect("state exists");
        assert_eq!(claim.as_deref(), Some("corr-reset-1"));

        // the confirm token is still live for the upload itself
        let key = StateKey::token(FlowKind::Reset, confirm_token.as_str());
        assert!(provider.get(&key).await.expect("store is reachable").is_some());
    }

    #[tokio::test]
    async fn unknown_confirm_token() {
        veridoc_test_utils::init_tracer();

        let provider = Provider::new();
        let request = ConfirmResetRequest {
            confirm_token: "never-minted".into(),
        };

        let err = confirm_reset(provider, &request).await.expect_err("token unknown");
        assert!(matches!(err, Error::NotFound(_)));
    }
}
