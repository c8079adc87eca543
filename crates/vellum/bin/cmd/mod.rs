//! Subcommands of the `vellum` binary.
//!
//! Commands that talk to a wallet take [`WalletOpts`](vellum_wallets::WalletOpts) and every
//! command takes [`ConfigOpts`](crate::args::ConfigOpts), which override `vellum.toml`.

pub mod call;
pub mod compile;
pub mod delete;
pub mod deploy;
pub mod functions;
pub mod list;
pub mod serve;
