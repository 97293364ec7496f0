//! # Veridoc Core
//!
//! Helpers shared by the `veridoc-integration` and `veridoc-service`
//! crates.
//!
//! The crate is for internal use within the Veridoc project and is not
//! intended to be used directly by end users.

pub mod gen;
