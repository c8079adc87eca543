//! Browser wallet bridge.
//!
//! A local HTTP server serves a page that talks to the injected EIP-1193 provider
//! (`window.ethereum`). Requests are queued here, picked up by the page and answered
//! through the `/api` routes, which require the per-server session token.

pub mod error;
pub mod server;
pub mod types;

mod app;
mod handlers;
mod provider;
mod queue;
mod router;
mod state;

pub use router::SESSION_TOKEN_HEADER;
