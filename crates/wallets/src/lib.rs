//! # vellum-wallets
//!
//! Wallet providers and the [`WalletSession`] that owns the connection to one of them.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod error;
pub use error::{PrivateKeyError, ProviderError, SessionError};

pub mod opts;
pub use opts::WalletOpts;

pub mod provider;
pub use provider::{ProviderEvent, TxReceipt, TxUpdate, WalletProvider};

pub mod rpc;
pub use rpc::RpcWalletProvider;

pub mod session;
pub use session::{SessionEvent, SessionGuard, SessionSnapshot, WalletSession};

pub mod utils;

pub mod wallet_browser;
pub use wallet_browser::server::BrowserWalletServer;
