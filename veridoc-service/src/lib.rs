//! An API for the verification service's side of the Veridoc
//! identity-document verification hand-off.
//!
//! # Design
//!
//! The service owns the verification gate: it mints single-redemption
//! service tokens at flow init, verifies uploaded identity documents, and
//! pushes the outcome to integration-owned webhooks. It never issues
//! sessions itself; it only generates the session id the integration will
//! later materialize.
//!
//! **Endpoints**
//!
//! The library is architected around the service endpoints, each with its
//! own `XxxRequest` and `XxxResponse` types that serialize to and from
//! JSON. The init endpoints back integration-authenticated routes; the
//! upload and confirm endpoints back browser-facing routes.
//!
//! Endpoints are designed to be used with Rust-based HTTP servers with a
//! few lines of wrapper code. For example, with
//! [axum](https://docs.rs/axum/latest/axum/):
//!
//! ```rust,ignore
//! async fn register_upload(
//!     State(provider): State<Provider>, Json(req): Json<RegisterUploadRequest>,
//! ) -> AxResult<RegisterUploadResponse> {
//!     veridoc_service::register_upload(provider, &req).await.into()
//! }
//! ```
//!
//! In addition, implementers provide a [`Provider`] responsible for
//! externals: subject and integration records, document verification,
//! webhook delivery, e-mail, and the TTL state store.

pub mod confirm;
pub mod init;
pub mod upload;

pub use veridoc_protocol::service::{
    ConfirmResetRequest, ConfirmResetResponse, Courier, DocumentCheck, Gateway, InitRegisterRequest,
    InitRegisterResponse, InitResetRequest, InitResetResponse, InitRestoreRequest,
    InitRestoreResponse, Integration, Metadata, Provider, RegisterUploadRequest,
    RegisterUploadResponse, ResetUploadRequest, ResetUploadResponse, RestoreUploadRequest,
    RestoreUploadResponse, Settings, Subject, SubjectRecord, UploadCallback,
};
pub use veridoc_protocol::{Error, FlowKind, Result, StateKey};

pub use self::confirm::confirm_reset;
pub use self::init::{init_register, init_reset, init_restore};
pub use self::upload::{register_upload, reset_upload, restore_upload};
