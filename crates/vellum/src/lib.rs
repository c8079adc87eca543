//! # vellum
//!
//! Compile, deploy and operate EVM contracts through a wallet session.
//!
//! The [`Studio`] ties the pieces together: a [`WalletSession`](vellum_wallets::WalletSession)
//! for signing, a [`TransactionTracker`] for finality, the [`DeploymentOrchestrator`] for
//! creation transactions and the [`AbiRegistry`] for calling deployed contracts.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod abi;
pub use abi::{AbiError, AbiRegistry, ContractInvoker, FunctionKind, InvokeError, ParamKind};

pub mod deploy;
pub use deploy::{DeployError, DeploymentHandle, DeploymentOrchestrator};

pub mod envelope;
pub use envelope::{
    AuthorizationEnvelope, AuthorizationEnvelopeBuilder, ContextFields, EnvelopeError, Intent,
};

pub mod studio;
pub use studio::{DeploymentOutcome, Studio, StudioError};

pub mod tx;
pub use tx::{TrackError, TrackedTransaction, TransactionRecord, TransactionTracker, TxStatus};
