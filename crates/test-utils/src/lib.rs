//! # Test Utilities for Veridoc
//!
//! Hard-coded provider trait implementations that can be used for testing
//! and examples.
//!
//! This crate provides common utilities for the Veridoc project and is
//! not intended to be used directly.

pub mod integration;
pub mod service;
pub mod store;

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Base URL of the test verification service.
pub const SERVICE_HOST: &str = "http://veridoc.io";

/// The single integration registered with the test service provider.
pub const INTEGRATION_ID: &str = "integration-1";

/// Image the test document check refuses to process.
pub const UNREADABLE_IMAGE: &str = "unreadable";

// initialise tracing once for all tests
static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// # Panics
///
/// Panics if the tracing subscriber cannot be set.
pub fn init_tracer() {
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::ERROR).finish();
        tracing::subscriber::set_global_default(subscriber).expect("subscriber set");
    });
}
