//! Test provider for the verification-service role.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use veridoc_core::gen;
use veridoc_protocol::provider::{Result, StateStore};
use veridoc_protocol::service::{
    Courier, DocumentCheck, Gateway, Integration, Metadata, Settings, Subject, SubjectRecord,
    UploadCallback,
};
use veridoc_protocol::StateKey;

use crate::store::{state, subject};
use crate::{INTEGRATION_ID, SERVICE_HOST, UNREADABLE_IMAGE};

/// Provider implementing the verification-service traits over in-memory
/// stores and recording mocks, with a single registered integration.
#[derive(Clone, Debug)]
pub struct Provider {
    pub state: state::Store,
    pub subjects: subject::SubjectStore,
    /// Records outbound webhook deliveries.
    pub gateway: Outbox,
    /// Records confirmation e-mails.
    pub courier: Mailbox,
    /// The integration every test subject belongs to.
    pub integration: Integration,
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: state::Store::new(),
            subjects: subject::SubjectStore::new(),
            gateway: Outbox::default(),
            courier: Mailbox::default(),
            integration: Integration {
                id: INTEGRATION_ID.into(),
                register_webhook: "https://integration.io/hooks/register".into(),
                restore_webhook: "https://integration.io/hooks/restore".into(),
                reset_confirmation_webhook: "https://integration.io/hooks/reset-confirmation".into(),
                reset_credentials_webhook: "https://integration.io/hooks/reset-credentials".into(),
                reset_upload_page: "https://integration.io/reset/upload".into(),
            },
        }
    }
}

impl veridoc_protocol::service::Provider for Provider {}

impl Metadata for Provider {
    async fn settings(&self) -> Result<Settings> {
        Ok(Settings {
            service_host: SERVICE_HOST.into(),
            token_ttl_secs: 600,
        })
    }

    async fn integration(&self, integration_id: &str) -> Result<Integration> {
        if integration_id == self.integration.id {
            Ok(self.integration.clone())
        } else {
            Err(anyhow!("integration not found: {integration_id}"))
        }
    }
}

impl Subject for Provider {
    async fn create(&self, integration_id: &str, email: &str) -> Result<String> {
        Ok(self.subjects.create(integration_id, email))
    }

    async fn find_by_email(
        &self, integration_id: &str, email: &str,
    ) -> Result<Option<SubjectRecord>> {
        Ok(self.subjects.find_by_email(integration_id, email))
    }

    async fn find(&self, subject_id: &str) -> Result<Option<SubjectRecord>> {
        Ok(self.subjects.find(subject_id))
    }

    async fn set_document(&self, subject_id: &str, document_id: &str) -> Result<()> {
        if self.subjects.set_document(subject_id, document_id) {
            Ok(())
        } else {
            Err(anyhow!("subject not found: {subject_id}"))
        }
    }
}

impl DocumentCheck for Provider {
    // The test check "detects" the image content as the document id.
    async fn document_id(&self, base64_image: &str) -> Result<String> {
        if base64_image == UNREADABLE_IMAGE {
            return Err(anyhow!("could not get the document id"));
        }
        Ok(base64_image.to_string())
    }
}

impl Gateway for Provider {
    async fn upload_callback(&self, url: &str, payload: &UploadCallback) -> Result<()> {
        self.gateway.deliver(url, payload)
    }

    async fn reset_confirmation(&self, url: &str) -> Result<String> {
        self.gateway.confirm(url)
    }
}

impl Courier for Provider {
    async fn send_confirmation(&self, email: &str, confirm_url: &str) -> Result<()> {
        self.courier.record(email, confirm_url);
        Ok(())
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

/// Records outbound webhook deliveries instead of making HTTP calls.
#[derive(Default, Clone, Debug)]
pub struct Outbox {
    fail: Arc<AtomicBool>,
    deliveries: Arc<Mutex<Vec<(String, UploadCallback)>>>,
    reset_correlation: Arc<Mutex<Option<String>>>,
}

impl Outbox {
    /// Make subsequent deliveries fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    /// Script the correlation token the integration hands back on reset
    /// confirmation.
    ///
    /// # Panics
    ///
    /// Panics if the mailbox lock is poisoned.
    pub fn set_reset_correlation(&self, correlation_token: &str) {
        *self.reset_correlation.lock().expect("should lock") =
            Some(correlation_token.to_string());
    }

    /// Webhook deliveries recorded so far, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the mailbox lock is poisoned.
    #[must_use]
    pub fn deliveries(&self) -> Vec<(String, UploadCallback)> {
        self.deliveries.lock().expect("should lock").clone()
    }

    fn deliver(&self, url: &str, payload: &UploadCallback) -> Result<()> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(anyhow!("webhook delivery failed"));
        }
        self.deliveries.lock().expect("should lock").push((url.to_string(), payload.clone()));
        Ok(())
    }

    fn confirm(&self, _url: &str) -> Result<String> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(anyhow!("webhook delivery failed"));
        }
        let configured = self.reset_correlation.lock().expect("should lock").clone();
        Ok(configured.unwrap_or_else(gen::correlation_token))
    }
}

/// Records confirmation e-mails instead of sending them.
#[derive(Default, Clone, Debug)]
pub struct Mailbox {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl Mailbox {
    /// E-mails recorded so far as `(recipient, confirm_url)` pairs.
    ///
    /// # Panics
    ///
    /// Panics if the mailbox lock is poisoned.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("should lock").clone()
    }

    fn record(&self, email: &str, confirm_url: &str) {
        self.sent.lock().expect("should lock").push((email.to_string(), confirm_url.to_string()));
    }
}
