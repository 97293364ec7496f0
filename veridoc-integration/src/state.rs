//! Flow token stages, decoded from the raw values the registry keeps in
//! the TTL store.

/// Sentinel marking a token that has not been bound yet. Must never be
/// compared against outside this module.
const PENDING: &str = "pending";

/// Stage of a flow token, decoded from the raw store value at the
/// registry boundary. A token with no live entry is simply absent; the
/// registry reports absence through its result types rather than a
/// variant here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FlowStage {
    /// Created at flow init; awaiting the verification gate's callback.
    Pending,

    /// Carrying the session id generated at upload time.
    Bound(String),
}

impl FlowStage {
    /// Decode a raw store value.
    pub(crate) fn decode(raw: &str) -> Self {
        if raw == PENDING {
            Self::Pending
        } else {
            Self::Bound(raw.to_string())
        }
    }

    /// Encode for storage.
    pub(crate) fn encode(&self) -> &str {
        match self {
            Self::Pending => PENDING,
            Self::Bound(session_id) => session_id,
        }
    }
}
