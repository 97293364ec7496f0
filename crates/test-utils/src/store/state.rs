//! In-memory TTL store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use veridoc_protocol::provider::{Result, StateStore};
use veridoc_protocol::StateKey;

/// In-memory stand-in for the shared TTL key-value store. Expiry is
/// honoured on read; [`Store::expire`] force-expires an entry so tests
/// can observe post-TTL behaviour without waiting.
#[derive(Default, Clone, Debug)]
pub struct Store {
    store: Arc<Mutex<HashMap<String, Entry>>>,
}

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn live(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Force an entry past its expiry.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    pub fn expire(&self, key: &StateKey) {
        let mut store = self.store.lock().expect("should lock");
        if let Some(entry) = store.get_mut(&key.to_string()) {
            entry.expires_at = Utc::now() - TimeDelta::try_seconds(1).unwrap_or_default();
        }
    }
}

impl StateStore for Store {
    async fn put(&self, key: &StateKey, value: &str, expiry: DateTime<Utc>) -> Result<()> {
        self.store.lock().expect("should lock").insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: expiry,
            },
        );
        Ok(())
    }

    async fn put_if_eq(
        &self, key: &StateKey, current: &str, value: &str, expiry: DateTime<Utc>,
    ) -> Result<bool> {
        let mut store = self.store.lock().expect("should lock");
        let Some(entry) = store.get_mut(&key.to_string()) else {
            return Ok(false);
        };
        if !entry.live() || entry.value != current {
            return Ok(false);
        }
        *entry = Entry {
            value: value.to_string(),
            expires_at: expiry,
        };
        Ok(true)
    }

    async fn get(&self, key: &StateKey) -> Result<Option<String>> {
        let mut store = self.store.lock().expect("should lock");
        let key = key.to_string();
        match store.get(&key) {
            Some(entry) if entry.live() => Ok(Some(entry.value.clone())),
            Some(_) => {
                store.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn purge(&self, key: &StateKey) -> Result<()> {
        self.store.lock().expect("should lock").remove(&key.to_string());
        Ok(())
    }
}
