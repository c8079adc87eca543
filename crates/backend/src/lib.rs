//! # vellum-backend
//!
//! Clients for the services vellum depends on: the compiler collaborator and the
//! persistence backend. Also hosts the `addContract` endpoint.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod client;
pub use client::BackendClient;

pub mod cloud;

pub mod compiler;
pub use compiler::{CompileRequest, CompiledArtifact, Compiler, HttpCompiler, SolcCompiler};

mod error;
pub use error::{BackendError, CompileError};

pub mod types;
pub use types::{DeleteResponse, DeployedContractRef, SaveRequest, SaveResponse, SignedPayload};
