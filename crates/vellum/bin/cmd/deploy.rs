use clap::{Parser, ValueHint};
use eyre::Result;
use std::path::PathBuf;
use vellum_wallets::WalletOpts;

use crate::{args::ConfigOpts, utils};

/// CLI arguments for `vellum deploy`.
#[derive(Clone, Debug, Parser)]
pub struct DeployArgs {
    /// The Solidity file to deploy.
    #[arg(value_hint = ValueHint::FilePath)]
    path: PathBuf,

    /// The constructor arguments.
    #[arg(num_args = 0..)]
    constructor_args: Vec<String>,

    /// Display name of the saved reference. Defaults to the contract name.
    #[arg(long)]
    name: Option<String>,

    /// Description of the saved reference.
    #[arg(long, default_value = "")]
    description: String,

    /// Deploy without saving a reference.
    #[arg(long)]
    no_save: bool,

    /// Print the outcome as JSON.
    #[arg(long, short)]
    json: bool,

    #[command(flatten)]
    wallet: WalletOpts,

    #[command(flatten)]
    config: ConfigOpts,
}

impl DeployArgs {
    pub async fn run(self) -> Result<()> {
        let config = self.config.load_config()?;
        let studio = utils::studio(&config, &self.wallet).await?;
        let request = utils::read_source(&self.path)?;
        let artifact = studio.compile(&request).await?;

        if self.no_save {
            let handle = studio.deploy(&artifact, &self.constructor_args).await?;
            let address = handle.contract_address().await?;
            println!("Deployer: {}", handle.from());
            println!("Deployed to: {}", vellum_common::address::to_canonical(&address));
            println!("Transaction hash: {}", handle.transaction_hash());
            let record = handle.wait_for_confirmation().await?;
            println!("Status: {}", utils::status_line(record.status));
            return Ok(());
        }

        let name = self.name.unwrap_or_else(|| artifact.contract_name.clone());
        let outcome = studio
            .deploy_and_save(&artifact, &self.constructor_args, &name, &self.description)
            .await?;

        if self.json {
            let json = serde_json::json!({
                "contractAddress": outcome.contract_address,
                "transactionHash": outcome.transaction_hash,
                "firestoreId": outcome.reference.firestore_id,
                "saveError": outcome.save_error.as_ref().map(|err| err.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        } else {
            println!("Deployed to: {}", outcome.contract_address);
            println!("Transaction hash: {}", outcome.transaction_hash);
            match (&outcome.reference.firestore_id, &outcome.save_error) {
                (Some(id), None) => println!("Saved as: {id}"),
                (_, Some(err)) => eprintln!(
                    "Warning: the contract is deployed but saving its reference failed: {}",
                    vellum_common::errors::display_chain(err as &(dyn std::error::Error + 'static))
                ),
                (None, None) => {}
            }
        }
        Ok(())
    }
}
