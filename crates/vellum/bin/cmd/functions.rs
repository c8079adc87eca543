use alloy_json_abi::JsonAbi;
use clap::{Parser, ValueHint};
use eyre::{Context, Result};
use itertools::Itertools;
use std::path::{Path, PathBuf};
use vellum::{AbiRegistry, FunctionKind, abi::InvocableFunction};

/// CLI arguments for `vellum functions`.
#[derive(Clone, Debug, Parser)]
pub struct FunctionsArgs {
    /// A JSON ABI, or an artifact with an `abi` field.
    #[arg(value_hint = ValueHint::FilePath)]
    path: PathBuf,

    /// Print the functions as JSON.
    #[arg(long, short)]
    json: bool,
}

impl FunctionsArgs {
    pub fn run(self) -> Result<()> {
        let abi = read_abi(&self.path)?;
        let registry = AbiRegistry::parse(&abi);
        if self.json {
            let functions = registry.functions().collect::<Vec<_>>();
            println!("{}", serde_json::to_string_pretty(&functions)?);
        } else {
            print_functions(&registry);
        }
        Ok(())
    }
}

/// Reads an ABI from a file holding either the ABI itself or an artifact.
pub fn read_abi(path: &Path) -> Result<JsonAbi> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .wrap_err_with(|| format!("{} is not valid JSON", path.display()))?;
    let abi = match value {
        serde_json::Value::Object(mut artifact) if artifact.contains_key("abi") => {
            artifact.remove("abi").unwrap_or_default()
        }
        abi => abi,
    };
    serde_json::from_value(abi).wrap_err("invalid ABI")
}

pub fn print_functions(registry: &AbiRegistry) {
    for (title, functions) in [("Read", registry.reads()), ("Write", registry.writes())] {
        if functions.is_empty() {
            continue;
        }
        println!("{title}:");
        for function in functions {
            println!("  {}", describe(function));
        }
    }

    if !registry.rejected().is_empty() {
        println!("Unsupported:");
        for rejected in registry.rejected() {
            println!("  {}: {}", rejected.signature, rejected.reason);
        }
    }
}

fn describe(function: &InvocableFunction) -> String {
    let inputs = function.inputs.iter().map(|p| format!("{} {}", p.ty, p.name).trim().to_string());
    let mut line = format!("{}({})", function.name, inputs.format(", "));
    if !function.outputs.is_empty() {
        line.push_str(&format!(" -> ({})", function.outputs.iter().map(|p| &p.ty).format(", ")));
    }
    if function.kind == FunctionKind::Payable {
        line.push_str(" payable");
    }
    line
}
