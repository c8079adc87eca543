use clap::Parser;
use eyre::Result;
use vellum_wallets::WalletOpts;

use crate::{args::ConfigOpts, utils};

/// CLI arguments for `vellum delete`.
#[derive(Clone, Debug, Parser)]
pub struct DeleteArgs {
    /// Address or backend identifier of the saved contract.
    contract: String,

    #[command(flatten)]
    wallet: WalletOpts,

    #[command(flatten)]
    config: ConfigOpts,
}

impl DeleteArgs {
    pub async fn run(self) -> Result<()> {
        let config = self.config.load_config()?;
        let studio = utils::studio(&config, &self.wallet).await?;
        let reference = utils::find_reference(&studio, &self.contract).await?;
        studio.delete_contract(&reference).await?;
        println!("Deleted {} ({})", reference.name, reference.contract_address);
        Ok(())
    }
}
