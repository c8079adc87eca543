use clap::Parser;
use eyre::{Context, Result};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use vellum_config::Config;

use crate::{
    provider::WalletProvider,
    rpc::{RpcWalletProvider, http_provider},
    utils::create_private_key_signer,
    wallet_browser::server::BrowserWalletServer,
};

/// Which wallet backs the session.
///
/// Without a private key the browser bridge is started and the user connects an
/// injected wallet from the page it serves.
#[derive(Clone, Debug, Default, Serialize, Parser)]
#[command(next_help_heading = "Wallet options", about = None, long_about = None)]
pub struct WalletOpts {
    /// Sign with the provided private key instead of a browser wallet.
    #[arg(long, env = "VELLUM_PRIVATE_KEY", value_name = "RAW_PRIVATE_KEY", hide_env_values = true)]
    #[serde(skip)]
    pub private_key: Option<String>,

    /// Use the unlocked accounts of the RPC node instead of a browser wallet.
    #[arg(long, conflicts_with = "private_key")]
    pub unlocked: bool,

    /// Port of the browser wallet bridge.
    #[arg(long, value_name = "PORT")]
    pub browser_port: Option<u16>,

    /// Seconds to wait for the browser wallet to answer.
    #[arg(long, value_name = "SECONDS")]
    pub browser_timeout: Option<u64>,
}

impl WalletOpts {
    /// Builds the provider selected by these options.
    pub async fn provider(&self, config: &Config) -> Result<Arc<dyn WalletProvider>> {
        if self.private_key.is_some() || self.unlocked {
            let rpc_url = config
                .rpc_url
                .as_deref()
                .ok_or_else(|| eyre::eyre!("an rpc url is required to sign locally, set `rpc_url`"))?;
            let signer = self
                .private_key
                .as_deref()
                .map(create_private_key_signer)
                .transpose()?;
            let provider = RpcWalletProvider::new(rpc_url, signer)?;
            return Ok(Arc::new(provider));
        }

        let port = self.browser_port.unwrap_or(config.browser_port);
        let timeout =
            self.browser_timeout.map(Duration::from_secs).unwrap_or(config.browser_timeout());
        let mut server = BrowserWalletServer::new(port, timeout);
        if let Some(rpc_url) = &config.rpc_url {
            server = server.with_reads(http_provider(rpc_url)?);
        }
        server.start().await.wrap_err("failed to start the browser wallet bridge")?;
        eprintln!("Open {} in a browser with your wallet to connect.", server.url());
        Ok(Arc::new(server))
    }
}

