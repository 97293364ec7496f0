//! # Provider
//!
//! Capabilities shared by both protocol roles.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::StateKey;

/// Result used for all provider-boundary errors.
pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// `StateStore` is the shared TTL key-value capability the hand-off runs
/// over. It is the only shared mutable resource in the protocol: all flow
/// state lives here, and a token that is never bound or consumed simply
/// expires.
///
/// Implementations must serialize operations on a single key and treat
/// expired entries as absent.
pub trait StateStore: Send + Sync {
    /// Store `value` under `key` until `expiry`.
    fn put(
        &self, key: &StateKey, value: &str, expiry: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Atomically replace the stored value with `value` when the current
    /// value equals `current`, re-arming expiry. Returns `false` without
    /// writing when the entry is absent, expired, or holds a different
    /// value.
    fn put_if_eq(
        &self, key: &StateKey, current: &str, value: &str, expiry: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Retrieve the value stored under `key`, or `None` when the entry is
    /// absent or expired.
    fn get(&self, key: &StateKey) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Remove the entry stored under `key`.
    fn purge(&self, key: &StateKey) -> impl Future<Output = Result<()>> + Send;
}
