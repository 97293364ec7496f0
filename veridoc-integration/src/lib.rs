//! An API for the integration side of the Veridoc identity-document
//! verification hand-off.
//!
//! # Design
//!
//! A backend integrating with the verification service delegates document
//! verification while keeping session issuance under its own control. The
//! hand-off runs entirely over a shared TTL key-value store: a
//! correlation token is minted here at flow init, handed to the end
//! user's browser, bound to a session id by the verification service's
//! webhook, and finally exchanged for a durable session.
//!
//! ```text
//! +---------+              +-------------+                +----------------------+
//! | Browser |              | Integration |                | Verification Service |
//! +---------+              +-------------+                +----------------------+
//!      |                          |                                   |
//!      |  (1) start flow          |                                   |
//!      |------------------------->|  init: mint service token         |
//!      |                          |---------------------------------->|
//!      |                          |  create pending correlation token |
//!      |  tokens + upload URL     |                                   |
//!      |<-------------------------|                                   |
//!      |                          |                                   |
//!      |  (2) upload document (service token, correlation token)      |
//!      |------------------------------------------------------------->|
//!      |                          |                                   |
//!      |                          |  (3) webhook {session, token}     |
//!      |                          |<----------------------------------|
//!      |                          |  bind: pending -> session id      |
//!      |                          |                                   |
//!      |  (4) setup session (correlation token)                       |
//!      |------------------------->|  establish: consume bound token,  |
//!      |      session id          |  materialize session              |
//!      |<-------------------------|                                   |
//! ```
//!
//! **Endpoints**
//!
//! The library is architected around the integration-side endpoints, each
//! with its own `XxxRequest` and `XxxResponse` types that serialize to
//! and from JSON. The endpoints are designed to be used with Rust-based
//! HTTP servers, such as [axum](https://docs.rs/axum/latest/axum/):
//! `init` and `setup_session` back routes called by the integration's own
//! frontend, while `upload` and `reset_confirmation` back the webhook
//! receivers the verification service pushes to.
//!
//! In addition, implementers provide a [`Provider`] responsible for
//! externals: the TTL state store, deployment settings, and the client
//! used to reach the verification service.

pub mod confirm;
pub mod init;
mod registry;
pub mod session;
mod state;
pub mod upload;

pub use veridoc_protocol::integration::{
    DeleteSessionRequest, DeleteSessionResponse, InitRequest, InitResponse, Metadata, Provider,
    ReadSessionRequest, ReadSessionResponse, ResetConfirmationRequest, ResetConfirmationResponse,
    ServiceClient, Settings, SetupSessionRequest, SetupSessionResponse, TokenGrant, UploadRequest,
    UploadResponse,
};
pub use veridoc_protocol::{Error, FlowKind, Result, StateKey};

pub use self::confirm::reset_confirmation;
pub use self::init::init;
pub use self::session::{delete_session, read_session, setup_session};
pub use self::upload::upload;
