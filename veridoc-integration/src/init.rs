//! # Init Endpoint
//!
//! Initiates a verification flow on behalf of an end user. The endpoint
//! asks the verification service to mint its redemption token, then
//! creates the pending correlation token that the rest of the flow will
//! bind and consume. Both tokens and the upload URL are returned for the
//! integration to hand to the end user's browser.
//!
//! The reset flow takes a different path: no token is handed out at init.
//! The service e-mails the end user a confirmation link, and the
//! correlation token is minted when the confirmation arrives (see
//! [`crate::confirm`]).

use tracing::instrument;
use veridoc_core::gen;
use veridoc_protocol::integration::{InitRequest, InitResponse, Metadata, Provider, ServiceClient};
use veridoc_protocol::{Error, FlowKind, Result};

use crate::registry;

/// Init request handler.
///
/// # Errors
///
/// Returns `InvalidRequest` when the request is malformed, and
/// `Unavailable` when the verification service or the state store cannot
/// complete their part of flow initiation. Failures never leave a
/// partially initiated flow behind: the caller retries `init` from
/// scratch.
#[instrument(level = "debug", skip(provider))]
pub async fn init(provider: impl Provider, request: &InitRequest) -> Result<InitResponse> {
    verify(request)?;
    process(provider, request).await
}

fn verify(request: &InitRequest) -> Result<()> {
    tracing::debug!("init::verify");

    if request.email.is_empty() {
        return Err(Error::InvalidRequest("no email specified".into()));
    }
    Ok(())
}

async fn process(provider: impl Provider, request: &InitRequest) -> Result<InitResponse> {
    tracing::debug!("init::process");

    let settings = Metadata::settings(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue reading settings: {e}")))?;

    let grant = match request.flow {
        FlowKind::Register => ServiceClient::init_register(&provider, &request.email).await,
        FlowKind::Restore => ServiceClient::init_restore(&provider, &request.email).await,
        FlowKind::Reset => {
            let upload_url =
                ServiceClient::init_reset(&provider, &request.email).await.map_err(|e| {
                    tracing::error!("reset init failed: {e}");
                    Error::Unavailable("verification service unavailable".into())
                })?;
            return Ok(InitResponse {
                upload_url,
                service_token: None,
                correlation_token: None,
            });
        }
    }
    .map_err(|e| {
        tracing::error!("flow init failed: {e}");
        Error::Unavailable("verification service unavailable".into())
    })?;

    let correlation_token = gen::correlation_token();
    if let Err(e) =
        registry::create_pending(&provider, request.flow, &correlation_token, settings.pending_ttl())
            .await
    {
        // without a pending entry the flow can never complete, so fail
        // soft rather than hand out dead tokens
        tracing::error!("issue creating pending token: {e}");
        return Err(Error::Unavailable("flow could not be initiated".into()));
    }

    Ok(InitResponse {
        upload_url: grant.upload_url,
        service_token: Some(grant.service_token),
        correlation_token: Some(correlation_token),
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;
    use veridoc_protocol::provider::StateStore;
    use veridoc_protocol::StateKey;
    use veridoc_test_utils::integration::Provider;
    use veridoc_test_utils::SERVICE_HOST;

    use super::*;

    #[rstest]
    #[case(FlowKind::Register)]
    #[case(FlowKind::Restore)]
    #[tokio::test]
    async fn token_flows(#[case] flow: FlowKind) {
        veridoc_test_utils::init_tracer();

        let provider = Provider::new();

        let body = json!({
            "flow": flow,
            "email": "a@b.com"
        });
        let request =
            serde_json::from_value::<InitRequest>(body).expect("request should deserialize");

        let response = init(provider.clone(), &request).await.expect("response is ok");
        assert_eq!(response.upload_url, format!("{SERVICE_HOST}/upload/{flow}"));
        assert!(response.service_token.is_some());

        // store now holds the pending correlation token
        let correlation_token = response.correlation_token.expect("token is set");
        let key = StateKey::token(flow, correlation_token.as_str());
        let value = provider.get(&key).await.expect("state exists");
        assert_eq!(value.as_deref(), Some("pending"));
    }

    #[tokio::test]
    async fn reset_has_no_tokens() {
        veridoc_test_utils::init_tracer();

        let provider = Provider::new();
        let request = InitRequest {
            flow: FlowKind::Reset,
            email: "a@b.com".into(),
        };

        let response = init(provider.clone(), &request).await.expect("response is ok");
        assert_eq!(response.upload_url, format!("{SERVICE_HOST}/upload/reset"));
        assert!(response.service_token.is_none());
        assert!(response.correlation_token.is_none());
    }

    #[tokio::test]
    async fn missing_email() {
        veridoc_test_utils::init_tracer();

        let provider = Provider::new();
        let request = InitRequest {
            flow: FlowKind::Register,
            email: String::new(),
        };

        let err = init(provider, &request).await.expect_err("request is invalid");
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn service_down() {
        veridoc_test_utils::init_tracer();

        let provider = Provider::new();
        provider.service.set_fail(true);

        let request = InitRequest {
            flow: FlowKind::Register,
            email: "a@b.com".into(),
        };

        let err = init(provider, &request).await.expect_err("service is down");
        assert!(matches!(err, Error::Unavailable(_)));
    }
}
