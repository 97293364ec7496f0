//! # Flow Token Registry
//!
//! One record per (flow, correlation token) pair. A token is created
//! pending at flow init, bound exactly once by the verification gate's
//! callback, and consumed exactly once at session establishment. The TTL
//! is the only cancellation mechanism: a token that is never bound or
//! consumed self-expires, after which every operation observes it as
//! absent.

use chrono::{TimeDelta, Utc};
use veridoc_protocol::provider::StateStore;
use veridoc_protocol::{Error, FlowKind, Result, StateKey};

use crate::state::FlowStage;

/// Create a flow token in the pending stage.
///
/// Token ids carry enough entropy that the registry does not check for an
/// existing entry.
pub(crate) async fn create_pending(
    store: &impl StateStore, flow: FlowKind, id: &str, ttl: TimeDelta,
) -> Result<()> {
    let key = StateKey::token(flow, id);
    store
        .put(&key, FlowStage::Pending.encode(), Utc::now() + ttl)
        .await
        .map_err(|e| Error::ServerError(format!("issue saving pending token: {e}")))
}

/// Transition a flow token from pending to bound, re-arming its TTL.
///
/// The swap is conditional on the stored value still being the pending
/// sentinel, so two racing binds cannot both succeed and a bound value is
/// never overwritten.
pub(crate) async fn bind(
    store: &impl StateStore, flow: FlowKind, id: &str, session_id: &str, ttl: TimeDelta,
) -> Result<()> {
    let key = StateKey::token(flow, id);
    let bound = FlowStage::Bound(session_id.to_string());

    let swapped = store
        .put_if_eq(&key, FlowStage::Pending.encode(), bound.encode(), Utc::now() + ttl)
        .await
        .map_err(|e| Error::ServerError(format!("issue binding token: {e}")))?;
    if !swapped {
        return Err(Error::NoPendingValue("no pending value".into()));
    }
    Ok(())
}

/// Consume a bound flow token, returning the session id bound into it.
///
/// A pending token is left in place (the flow may still complete). A
/// bound token is deleted before the value is returned, so a second
/// establish observes `NotFound` whatever happens downstream.
pub(crate) async fn establish(store: &impl StateStore, flow: FlowKind, id: &str) -> Result<String> {
    let key = StateKey::token(flow, id);

    let Some(raw) = store
        .get(&key)
        .await
        .map_err(|e| Error::ServerError(format!("issue reading token: {e}")))?
    else {
        return Err(Error::NotFound("not found".into()));
    };
    let FlowStage::Bound(session_id) = FlowStage::decode(&raw) else {
        return Err(Error::NotFound("not found".into()));
    };

    store
        .purge(&key)
        .await
        .map_err(|e| Error::ServerError(format!("issue consuming token: {e}")))?;

    Ok(session_id)
}
