//! Test provider for the integration role.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use veridoc_core::gen;
use veridoc_protocol::integration::{Metadata, ServiceClient, Settings, TokenGrant};
use veridoc_protocol::provider::{Result, StateStore};
use veridoc_protocol::{FlowKind, StateKey};

use crate::store::state;
use crate::SERVICE_HOST;

/// Provider implementing the integration-side traits over in-memory
/// stores and a scripted verification service.
#[derive(Default, Clone, Debug)]
pub struct Provider {
    pub state: state::Store,
    pub service: ServiceStub,
}

impl Provider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl veridoc_protocol::integration::Provider for Provider {}

impl Metadata for Provider {
    async fn settings(&self) -> Result<Settings> {
        Ok(Settings::default())
    }
}

impl ServiceClient for Provider {
    async fn init_register(&self, email: &str) -> Result<TokenGrant> {
        self.service.init(FlowKind::Register, email)
    }

    async fn init_restore(&self, email: &str) -> Result<TokenGrant> {
        self.service.init(FlowKind::Restore, email)
    }

    async fn init_reset(&self, email: &str) -> Result<String> {
        self.service.init(FlowKind::Reset, email).map(|grant| grant.upload_url)
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

/// Scripted stand-in for the verification service's init endpoints.
#[derive(Default, Clone, Debug)]
pub struct ServiceStub {
    fail: Arc<AtomicBool>,
}

impl ServiceStub {
    /// Make subsequent init calls fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    fn init(&self, flow: FlowKind, _email: &str) -> Result<TokenGrant> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(anyhow!("service offline"));
        }
        Ok(TokenGrant {
            service_token: gen::service_token(),
            upload_url: format!("{SERVICE_HOST}/upload/{flow}"),
        })
    }
}
