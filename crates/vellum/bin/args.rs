use crate::cmd::{
    call::CallArgs, compile::CompileArgs, delete::DeleteArgs, deploy::DeployArgs,
    functions::FunctionsArgs, list::ListArgs, serve::ServeArgs,
};
use clap::{Parser, Subcommand};
use eyre::Result;
use serde::Serialize;
use vellum_config::{Config, figment::providers::Serialized};

/// Compile, deploy and operate contracts through a browser wallet.
#[derive(Parser)]
#[command(name = "vellum", version, next_display_order = None)]
pub struct Vellum {
    #[command(subcommand)]
    pub cmd: VellumSubcommand,
}

#[derive(Subcommand)]
pub enum VellumSubcommand {
    /// Compile a Solidity file.
    #[command(visible_alias = "c")]
    Compile(CompileArgs),

    /// Compile, deploy and save a contract.
    #[command(visible_alias = "d")]
    Deploy(DeployArgs),

    /// List the callable functions of an ABI.
    #[command(visible_alias = "fn")]
    Functions(FunctionsArgs),

    /// Call or transact with a saved contract.
    Call(CallArgs),

    /// List the contracts saved for the connected account.
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Delete a saved contract reference.
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),

    /// Serve the `addContract` endpoint.
    Serve(ServeArgs),
}

/// Settings that override the config file and environment.
#[derive(Clone, Debug, Default, Serialize, Parser)]
#[command(next_help_heading = "Config options")]
pub struct ConfigOpts {
    /// JSON-RPC endpoint for read calls and confirmation waits.
    #[arg(long, value_name = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    /// Base URL of the persistence backend.
    #[arg(long, value_name = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,

    /// Base URL of the compiler service. Local `solc` is used when unset.
    #[arg(long, value_name = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_url: Option<String>,

    /// Network to deploy to, by name or chain id.
    #[arg(long, short)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// Confirmations to wait for.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
}

impl ConfigOpts {
    /// Loads the config with these options merged on top.
    pub fn load_config(&self) -> Result<Config> {
        let figment = Config::figment().merge(Serialized::defaults(self));
        Ok(Config::try_from(figment)?)
    }
}
