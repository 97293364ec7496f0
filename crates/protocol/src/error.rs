//! # Protocol Errors
//!
//! Error taxonomy for the verification hand-off. Every public operation
//! returns a tagged result; the serialized form of an error is the wire
//! shape routing layers respond with.

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Hand-off protocol error codes.
#[derive(Error, Debug, Deserialize)]
pub enum Error {
    /// The request is missing a required parameter or is otherwise
    /// malformed. Rejected before any store mutation.
    #[error(r#"{{"error": "invalid_request", "error_description": "{0}"}}"#)]
    InvalidRequest(String),

    /// The referenced token, subject, or session is absent or expired.
    #[error(r#"{{"error": "not_found", "error_description": "{0}"}}"#)]
    NotFound(String),

    /// A bind was attempted on a token that is not pending. Reported as a
    /// failure rather than an exception so the caller can distinguish
    /// "retry later" from "fatal".
    #[error(r#"{{"error": "no_pending_value", "error_description": "{0}"}}"#)]
    NoPendingValue(String),

    /// Document verification failed. The upload can be retried within the
    /// token's TTL window.
    #[error(r#"{{"error": "unprocessable_document", "error_description": "{0}"}}"#)]
    UnprocessableDocument(String),

    /// The verified document belongs to a different subject. Not
    /// retryable without a new flow.
    #[error(r#"{{"error": "forbidden", "error_description": "{0}"}}"#)]
    Forbidden(String),

    /// A collaborator (store, webhook, or the verification service) was
    /// unreachable. Retryable.
    #[error(r#"{{"error": "unavailable", "error_description": "{0}"}}"#)]
    Unavailable(String),

    /// An unexpected internal condition. Details are logged with context;
    /// callers receive the opaque code only.
    #[error(r#"{{"error": "server_error", "error_description": "{0}"}}"#)]
    ServerError(String),
}

/// Error response for hand-off endpoints.
#[allow(clippy::module_name_repetitions)]
#[derive(Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,

    /// Error description.
    pub error_description: String,
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as SerdeError;

        let Ok(error) = serde_json::from_str::<ErrorResponse>(&self.to_string()) else {
            return Err(SerdeError::custom("issue serializing Error"));
        };
        error.serialize(serializer)
    }
}

impl Error {
    /// The HTTP status a routing layer should respond with.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::NoPendingValue(_) => 409,
            Self::UnprocessableDocument(_) => 422,
            Self::ServerError(_) => 500,
            Self::Unavailable(_) => 502,
        }
    }

    /// Transform the error to the wire-compatible JSON format.
    #[must_use]
    pub fn to_json(self) -> serde_json::Value {
        serde_json::from_str(&self.to_string()).unwrap_or_default()
    }
}
