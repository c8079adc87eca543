use eyre::{Context, Result};
use std::{path::Path, sync::Arc};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use vellum::{Studio, TxStatus};
use vellum_backend::{
    BackendClient, CompileRequest, Compiler, HttpCompiler, SolcCompiler, types::DeployedContractRef,
};
use vellum_common::address::parse_address;
use vellum_config::Config;
use vellum_wallets::{WalletOpts, WalletSession};

/// Installs the `tracing` subscriber. `RUST_LOG` overrides the default `vellum=info`.
pub fn subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vellum=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// The compiler selected by the config: the microservice if configured, local `solc` otherwise.
pub fn compiler(config: &Config) -> Result<Arc<dyn Compiler>> {
    Ok(match &config.compiler_url {
        Some(url) => Arc::new(HttpCompiler::new(url)?),
        None => Arc::new(SolcCompiler::new(&config.solc)),
    })
}

/// Reads a Solidity file into a compile request.
pub fn read_source(path: &Path) -> Result<CompileRequest> {
    let source = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| eyre::eyre!("invalid source path {}", path.display()))?;
    Ok(CompileRequest::new(file_name, source))
}

/// Builds a studio over a freshly connected wallet session.
pub async fn studio(config: &Config, wallet: &WalletOpts) -> Result<Studio> {
    let provider = wallet.provider(config).await?;
    let session = Arc::new(WalletSession::new(provider));
    let address = session.connect().await?;
    info!(%address, "wallet connected");

    let studio = Studio::new(
        session,
        compiler(config)?,
        BackendClient::new(&config.backend_url)?,
        config.network()?,
        config.confirmations,
    )?;
    Ok(studio)
}

/// Finds a stored reference by contract address or backend identifier.
pub async fn find_reference(studio: &Studio, key: &str) -> Result<DeployedContractRef> {
    let address = parse_address(key).ok();
    studio
        .list_contracts()
        .await?
        .into_iter()
        .find(|reference| match address {
            Some(address) => reference.contract_address.address() == address,
            None => reference.firestore_id.as_deref() == Some(key),
        })
        .ok_or_else(|| eyre::eyre!("no saved contract matches `{key}`"))
}

pub fn status_line(status: TxStatus) -> &'static str {
    match status {
        TxStatus::Submitted => "submitted",
        TxStatus::Pending => "pending",
        TxStatus::Confirmed => "confirmed",
        TxStatus::Reverted => "reverted",
        TxStatus::Failed => "failed",
    }
}
