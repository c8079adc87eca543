//! # vellum-common
//!
//! Common utilities shared by the vellum crates.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod address;
pub use address::{CanonicalAddress, normalize as normalize_address};

pub mod errors;
pub use errors::ErrorKind;

pub mod network;
pub use network::Network;

pub mod units;
