//! End-to-end runs of the three verification flows, with the test body
//! playing the browser and the HTTP transport between the two parties.

use chrono::{DateTime, Utc};
use veridoc_integration::{
    init, read_session, reset_confirmation, setup_session, upload, FlowKind, InitRequest,
    ReadSessionRequest, ResetConfirmationRequest, SetupSessionRequest, TokenGrant, UploadRequest,
};
use veridoc_protocol::provider::{Result, StateStore};
use veridoc_protocol::{Error, StateKey};
use veridoc_service::{
    confirm_reset, register_upload, reset_upload, restore_upload, ConfirmResetRequest,
    InitRegisterRequest, InitResetRequest, InitRestoreRequest, RegisterUploadRequest,
    ResetUploadRequest, RestoreUploadRequest, SubjectRecord,
};
use veridoc_test_utils::store::state;
use veridoc_test_utils::{service, INTEGRATION_ID};

const DOCUMENT_ID: &str = "120398450983";

/// Integration provider wired straight to a verification-service
/// provider: its service client invokes the service endpoints in-process.
#[derive(Clone, Debug)]
struct Provider {
    state: state::Store,
    service: service::Provider,
}

impl Provider {
    fn new(service: service::Provider) -> Self {
        Self {
            state: state::Store::new(),
            service,
        }
    }
}

impl veridoc_integration::Provider for Provider {}

impl veridoc_integration::Metadata for Provider {
    async fn settings(&self) -> Result<veridoc_integration::Settings> {
        Ok(veridoc_integration::Settings::default())
    }
}

impl veridoc_integration::ServiceClient for Provider {
    async fn init_register(&self, email: &str) -> Result<TokenGrant> {
        let request = InitRegisterRequest {
            integration_id: INTEGRATION_ID.into(),
            email: email.into(),
        };
        let response = veridoc_service::init_register(self.service.clone(), &request)
            .await
            .map_err(anyhow::Error::new)?;
        Ok(TokenGrant {
            service_token: response.service_token,
            upload_url: response.upload_url,
        })
    }

    async fn init_restore(&self, email: &str) -> Result<TokenGrant> {
        let request = InitRestoreRequest {
            integration_id: INTEGRATION_ID.into(),
            email: email.into(),
        };
        let response = veridoc_service::init_restore(self.service.clone(), &request)
            .await
            .map_err(anyhow::Error::new)?;
        Ok(TokenGrant {
            service_token: response.service_token,
            upload_url: response.upload_url,
        })
    }

    async fn init_reset(&self, email: &str) -> Result<String> {
        let request = InitResetRequest {
            integration_id: INTEGRATION_ID.into(),
            email: email.into(),
        };
        let response = veridoc_service::init_reset(self.service.clone(), &request)
            .await
            .map_err(anyhow::Error::new)?;
        Ok(response.upload_url)
    }
}

impl StateStore for Provider {
    async fn put(&self, key: &StateKey, value: &str, expiry: DateTime<Utc>) -> Result<()> {
        self.state.put(key, value, expiry).await
    }

    async fn put_if_eq(
        &self, key: &StateKey, current: &str, value: &str, expiry: DateTime<Utc>,
    ) -> Result<bool> {
        self.state.put_if_eq(key, current, value, expiry).await
    }

    async fn get(&self, key: &StateKey) -> Result<Option<String>> {
        self.state.get(key).await
    }

    async fn purge(&self, key: &StateKey) -> Result<()> {
        self.state.purge(key).await
    }
}

// Run through the entire register flow, then check replay resistance.
#[tokio::test]
async fn register_flow() {
    veridoc_test_utils::init_tracer();

    let svc = service::Provider::new();
    let integration = Provider::new(svc.clone());

    // integration backend initiates the flow
    let request = InitRequest {
        flow: FlowKind::Register,
        email: "a@b.com".into(),
    };
    let initiated = init(integration.clone(), &request).await.expect("flow initiated");
    let correlation_token = initiated.correlation_token.expect("token is set");
    let service_token = initiated.service_token.expect("token is set");

    // browser uploads the identity document to the verification service
    let request = RegisterUploadRequest {
        service_token,
        correlation_token: correlation_token.clone(),
        base64_image: DOCUMENT_ID.into(),
    };
    register_upload(svc.clone(), &request).await.expect("document accepted");

    // the service pushed the outcome; play the transport and bind
    let deliveries = svc.gateway.deliveries();
    assert_eq!(deliveries.len(), 1);
    let (url, callback) = &deliveries[0];
    assert_eq!(url, &svc.integration.register_webhook);
    assert_eq!(callback.correlation_token, correlation_token);

    let request = UploadRequest {
        flow: FlowKind::Register,
        correlation_token: correlation_token.clone(),
        session_id: callback.session_id.clone(),
    };
    upload(integration.clone(), &request).await.expect("token bound");

    // browser exchanges the bound token for a durable session
    let request = SetupSessionRequest {
        flow: FlowKind::Register,
        subject_id: "user-1".into(),
        correlation_token: correlation_token.clone(),
    };
    let session = setup_session(integration.clone(), &request).await.expect("session created");
    assert_eq!(session.session_id, callback.session_id);
    assert_eq!(session.max_age, 5_184_000 * 1000);

    // the token is consumed and cannot be replayed
    let err = setup_session(integration.clone(), &request).await.expect_err("token consumed");
    assert!(matches!(err, Error::NotFound(_)));

    let request = UploadRequest {
        flow: FlowKind::Register,
        correlation_token,
        session_id: "sess-other".into(),
    };
    let err = upload(integration.clone(), &request).await.expect_err("binding is final");
    assert!(matches!(err, Error::NoPendingValue(_)));

    // the session resolves to the integration's subject
    let request = ReadSessionRequest {
        session_id: session.session_id,
    };
    let read = read_session(integration, &request).await.expect("session exists");
    assert_eq!(read.subject_id.as_deref(), Some("user-1"));
}

// Run through the restore flow for a subject registered earlier.
#[tokio::test]
async fn restore_flow() {
    veridoc_test_utils::init_tracer();

    let svc = service::Provider::new();
    svc.subjects.add(SubjectRecord {
        id: "subject-1".into(),
        integration_id: INTEGRATION_ID.into(),
        email: "a@b.com".into(),
        document_id: Some(DOCUMENT_ID.into()),
    });
    let integration = Provider::new(svc.clone());

    let request = InitRequest {
        flow: FlowKind::Restore,
        email: "a@b.com".into(),
    };
    let initiated = init(integration.clone(), &request).await.expect("flow initiated");
    let correlation_token = initiated.correlation_token.expect("token is set");

    let request = RestoreUploadRequest {
        service_token: initiated.service_token.expect("token is set"),
        correlation_token: correlation_token.clone(),
        base64_image: DOCUMENT_ID.into(),
    };
    restore_upload(svc.clone(), &request).await.expect("document accepted");

    let deliveries = svc.gateway.deliveries();
    assert_eq!(deliveries.len(), 1);
    let (url, callback) = &deliveries[0];
    assert_eq!(url, &svc.integration.restore_webhook);

    let request = UploadRequest {
        flow: FlowKind::Restore,
        correlation_token: correlation_token.clone(),
        session_id: callback.session_id.clone(),
    };
    upload(integration.clone(), &request).await.expect("token bound");

    let request = SetupSessionRequest {
        flow: FlowKind::Restore,
        subject_id: "user-1".into(),
        correlation_token,
    };
    let session = setup_session(integration, &request).await.expect("session created");
    assert_eq!(session.session_id, callback.session_id);
}

// Someone else's document must not restore access: no webhook fires and
// the flow token never binds.
#[tokio::test]
async fn restore_rejects_foreign_document() {
    veridoc_test_utils::init_tracer();

    let svc = service::Provider::new();
    svc.subjects.add(SubjectRecord {
        id: "subject-1".into(),
        integration_id: INTEGRATION_ID.into(),
        email: "a@b.com".into(),
        document_id: Some(DOCUMENT_ID.into()),
    });
    let integration = Provider::new(svc.clone());

    let request = InitRequest {
        flow: FlowKind::Restore,
        email: "a@b.com".into(),
    };
    let initiated = init(integration.clone(), &request).await.expect("flow initiated");
    let correlation_token = initiated.correlation_token.expect("token is set");

    let request = RestoreUploadRequest {
        service_token: initiated.service_token.expect("token is set"),
        correlation_token: correlation_token.clone(),
        base64_image: "999999999999".into(),
    };
    let err = restore_upload(svc.clone(), &request).await.expect_err("wrong document");
    assert!(matches!(err, Error::Forbidden(_)));
    assert!(svc.gateway.deliveries().is_empty());

    // nothing ever binds the token, so no session can be established
    let request = SetupSessionRequest {
        flow: FlowKind::Restore,
        subject_id: "user-1".into(),
        correlation_token,
    };
    let err = setup_session(integration, &request).await.expect_err("never bound");
    assert!(matches!(err, Error::NotFound(_)));
}

// Run through the reset flow, including the e-mail confirmation hop.
#[tokio::test]
async fn reset_flow() {
    veridoc_test_utils::init_tracer();

    let svc = service::Provider::new();
    svc.subjects.add(SubjectRecord {
        id: "subject-1".into(),
        integration_id: INTEGRATION_ID.into(),
        email: "a@b.com".into(),
        document_id: Some(DOCUMENT_ID.into()),
    });
    let integration = Provider::new(svc.clone());

    // init hands out no tokens for reset
    let request = InitRequest {
        flow: FlowKind::Reset,
        email: "a@b.com".into(),
    };
    let initiated = init(integration.clone(), &request).await.expect("flow initiated");
    assert!(initiated.service_token.is_none());
    assert!(initiated.correlation_token.is_none());

    // the confirmation link reaches the end user by e-mail
    let sent = svc.courier.sent();
    assert_eq!(sent.len(), 1);
    let confirm_token =
        sent[0].1.split("token=").nth(1).expect("link carries the token").to_string();

    // the service's confirmation webhook asks the integration for a
    // correlation token; play the transport between the two
    let minted = reset_confirmation(integration.clone(), &ResetConfirmationRequest {})
        .await
        .expect("token minted");
    svc.gateway.set_reset_correlation(&minted.correlation_token);

    let request = ConfirmResetRequest {
        confirm_token: confirm_token.clone(),
    };
    let confirmed = confirm_reset(svc.clone(), &request).await.expect("reset confirmed");
    assert_eq!(
        confirmed.redirect_url,
        format!("{}?token={confirm_token}", svc.integration.reset_upload_page)
    );

    // browser uploads the replacement document
    let request = ResetUploadRequest {
        service_token: confirm_token,
        base64_image: "999999999999".into(),
    };
    let uploaded = reset_upload(svc.clone(), &request).await.expect("document accepted");
    assert_eq!(uploaded.correlation_token, minted.correlation_token);

    let deliveries = svc.gateway.deliveries();
    assert_eq!(deliveries.len(), 1);
    let (url, callback) = &deliveries[0];
    assert_eq!(url, &svc.integration.reset_credentials_webhook);

    let request = UploadRequest {
        flow: FlowKind::Reset,
        correlation_token: uploaded.correlation_token.clone(),
        session_id: callback.session_id.clone(),
    };
    upload(integration.clone(), &request).await.expect("token bound");

    let request = SetupSessionRequest {
        flow: FlowKind::Reset,
        subject_id: "user-1".into(),
        correlation_token: uploaded.correlation_token,
    };
    let session = setup_session(integration, &request).await.expect("session created");
    assert_eq!(session.session_id, callback.session_id);

    // the replacement document is now the one on record
    let subject = svc.subjects.find("subject-1").expect("subject exists");
    assert_eq!(subject.document_id.as_deref(), Some("999999999999"));
}
