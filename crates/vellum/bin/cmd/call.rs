use clap::{Parser, ValueHint};
use eyre::Result;
use std::path::PathBuf;
use vellum::{AbiRegistry, ContractInvoker, TxStatus};
use vellum_common::address::parse_address;
use vellum_wallets::WalletOpts;

use crate::{args::ConfigOpts, cmd::functions::read_abi, utils};

/// CLI arguments for `vellum call`.
#[derive(Clone, Debug, Parser)]
pub struct CallArgs {
    /// Address or backend identifier of a saved contract.
    contract: String,

    /// Function name, or full signature for overloaded functions.
    function: String,

    /// The function arguments.
    #[arg(num_args = 0..)]
    args: Vec<String>,

    /// Native amount to send to a payable function, e.g. `0.01`.
    #[arg(long)]
    value: Option<String>,

    /// Use this ABI instead of a saved reference. `CONTRACT` must then be an address on the
    /// configured network.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    abi: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long, short)]
    json: bool,

    #[command(flatten)]
    wallet: WalletOpts,

    #[command(flatten)]
    config: ConfigOpts,
}

impl CallArgs {
    pub async fn run(self) -> Result<()> {
        let config = self.config.load_config()?;
        let studio = utils::studio(&config, &self.wallet).await?;

        let invoker = match &self.abi {
            Some(path) => ContractInvoker::new(
                parse_address(&self.contract)?,
                studio.network().chain_id(),
                AbiRegistry::parse(&read_abi(path)?),
                studio.session().clone(),
                studio.tracker().clone(),
            ),
            None => studio.interface(&utils::find_reference(&studio, &self.contract).await?)?,
        };

        if invoker.registry().function(&self.function)?.kind.is_read() {
            let values = invoker.invoke_read(&self.function, &self.args).await?;
            if self.json {
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                for value in values {
                    println!("{value}");
                }
            }
            return Ok(());
        }

        let tx = invoker.invoke_write(&self.function, &self.args, self.value.as_deref()).await?;
        println!("Transaction hash: {}", tx.hash());
        let record = tx.wait().await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else {
            println!("Status: {}", utils::status_line(record.status));
        }
        if record.status != TxStatus::Confirmed {
            eyre::bail!(
                "transaction {} {}{}",
                record.hash,
                utils::status_line(record.status),
                record.error.map(|err| format!(": {err}")).unwrap_or_default()
            );
        }
        Ok(())
    }
}
