use clap::{Parser, ValueHint};
use eyre::Result;
use std::path::PathBuf;
use vellum::AbiRegistry;

use crate::{args::ConfigOpts, cmd::functions::print_functions, utils};

/// CLI arguments for `vellum compile`.
#[derive(Clone, Debug, Parser)]
pub struct CompileArgs {
    /// The Solidity file to compile.
    #[arg(value_hint = ValueHint::FilePath)]
    path: PathBuf,

    /// Print the artifact as JSON.
    #[arg(long, short)]
    json: bool,

    #[command(flatten)]
    config: ConfigOpts,
}

impl CompileArgs {
    pub async fn run(self) -> Result<()> {
        let config = self.config.load_config()?;
        let request = utils::read_source(&self.path)?;
        let artifact = utils::compiler(&config)?.compile(&request).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&artifact)?);
            return Ok(());
        }

        for warning in &artifact.warnings {
            eprintln!("Warning: {warning}");
        }
        println!("Compiled {} ({} bytes)", artifact.contract_name, artifact.bytecode.len());
        print_functions(&AbiRegistry::parse(&artifact.abi));
        Ok(())
    }
}
