use clap::Parser;
use eyre::Result;
use vellum_wallets::WalletOpts;

use crate::{args::ConfigOpts, utils};

/// CLI arguments for `vellum list`.
#[derive(Clone, Debug, Parser)]
pub struct ListArgs {
    /// Print the references as JSON.
    #[arg(long, short)]
    json: bool,

    #[command(flatten)]
    wallet: WalletOpts,

    #[command(flatten)]
    config: ConfigOpts,
}

impl ListArgs {
    pub async fn run(self) -> Result<()> {
        let config = self.config.load_config()?;
        let studio = utils::studio(&config, &self.wallet).await?;
        let references = studio.list_contracts().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&references)?);
            return Ok(());
        }
        if references.is_empty() {
            println!("No contracts saved yet.");
            return Ok(());
        }
        for reference in references {
            println!(
                "{}  {}  {}  {}",
                reference.contract_address,
                reference.network,
                reference.firestore_id.as_deref().unwrap_or("-"),
                reference.name,
            );
        }
        Ok(())
    }
}
