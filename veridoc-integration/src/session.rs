//! # Session Endpoints
//!
//! Converts a bound flow token into a durable session record, plus the
//! lookup and logout pass-throughs used by authenticated requests. The
//! session id is the value the verification gate generated at upload
//! time; this module only materializes it.

use chrono::Utc;
use tracing::instrument;
use veridoc_protocol::integration::{
    DeleteSessionRequest, DeleteSessionResponse, Metadata, Provider, ReadSessionRequest,
    ReadSessionResponse, SetupSessionRequest, SetupSessionResponse,
};
use veridoc_protocol::provider::StateStore;
use veridoc_protocol::{Error, Result, StateKey};

use crate::registry;

/// Session setup handler: consumes the flow token and materializes the
/// session.
///
/// # Errors
///
/// Returns `InvalidRequest` when the request is malformed and `NotFound`
/// when the token was never bound, has expired, or was already consumed.
#[instrument(level = "debug", skip(provider))]
pub async fn setup_session(
    provider: impl Provider, request: &SetupSessionRequest,
) -> Result<SetupSessionResponse> {
    verify(request)?;
    process(provider, request).await
}

fn verify(request: &SetupSessionRequest) -> Result<()> {
    tracing::debug!("setup_session::verify");

    if request.subject_id.is_empty() {
        return Err(Error::InvalidRequest("no subject specified".into()));
    }
    if request.correlation_token.is_empty() {
        return Err(Error::InvalidRequest("no correlation token specified".into()));
    }
    Ok(())
}

async fn process(
    provider: impl Provider, request: &SetupSessionRequest,
) -> Result<SetupSessionResponse> {
    tracing::debug!("setup_session::process");

    let settings = Metadata::settings(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue reading settings: {e}")))?;

    // consumes the token: a retry after this point observes NotFound
    let session_id =
        registry::establish(&provider, request.flow, &request.correlation_token).await?;

    // session ids are freshly generated at upload time, so last-write-wins
    // is acceptable here
    provider
        .put(
            &StateKey::session(session_id.as_str()),
            &request.subject_id,
            Utc::now() + settings.session_ttl(),
        )
        .await
        .map_err(|e| Error::ServerError(format!("issue saving session: {e}")))?;

    Ok(SetupSessionResponse {
        session_id,
        max_age: settings.session_ttl_secs * 1000,
    })
}

/// Session lookup handler for authenticated requests. An absent session
/// is an ordinary outcome here, reported in the response rather than as
/// an error.
///
/// # Errors
///
/// Returns `ServerError` when the state store is unreachable.
#[instrument(level = "debug", skip(provider))]
pub async fn read_session(
    provider: impl Provider, request: &ReadSessionRequest,
) -> Result<ReadSessionResponse> {
    let subject_id = provider
        .get(&StateKey::session(request.session_id.as_str()))
        .await
        .map_err(|e| Error::ServerError(format!("issue reading session: {e}")))?;

    Ok(ReadSessionResponse { subject_id })
}

/// Logout handler.
///
/// # Errors
///
/// Returns `ServerError` when the state store is unreachable.
#[instrument(level = "debug", skip(provider))]
pub async fn delete_session(
    provider: impl Provider, request: &DeleteSessionRequest,
) -> Result<DeleteSessionResponse> {
    provider
        .purge(&StateKey::session(request.session_id.as_str()))
        .await
        .map_err(|e| Error::ServerError(format!("issue deleting session: {e}")))?;

    Ok(DeleteSessionResponse {})
}
