//! # vellum-test-utils
//!
//! Shared helpers for the vellum test suites.

#![warn(unused_crate_dependencies)]

pub mod fixtures;

mod mock;
pub use mock::{MockCall, MockProvider};

/// Initializes tracing for tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
