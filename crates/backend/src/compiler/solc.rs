use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{collections::BTreeMap, path::PathBuf, process::Stdio};
use tokio::{io::AsyncWriteExt, process::Command};

use super::{CompileRequest, CompiledArtifact, Compiler};
use crate::error::CompileError;

/// Compiles with a local `solc` binary through its standard JSON interface.
#[derive(Clone, Debug)]
pub struct SolcCompiler {
    solc: PathBuf,
}

impl Default for SolcCompiler {
    fn default() -> Self {
        Self::new("solc")
    }
}

impl SolcCompiler {
    pub fn new(solc: impl Into<PathBuf>) -> Self {
        Self { solc: solc.into() }
    }

    /// The standard JSON input for `request`: ABI and creation bytecode, optimizer on.
    pub fn input(request: &CompileRequest) -> serde_json::Value {
        json!({
            "language": "Solidity",
            "sources": {
                &request.file_name: { "content": request.source_code }
            },
            "settings": {
                "optimizer": { "enabled": true, "runs": 200 },
                "outputSelection": {
                    "*": { "*": ["abi", "evm.bytecode.object"] }
                }
            }
        })
    }
}

#[async_trait]
impl Compiler for SolcCompiler {
    async fn compile(&self, request: &CompileRequest) -> Result<CompiledArtifact, CompileError> {
        debug!(solc = %self.solc.display(), file = %request.file_name, "compiling with solc");
        let input = serde_json::to_vec(&Self::input(request))
            .map_err(|err| CompileError::Solc(err.to_string()))?;

        let mut child = Command::new(&self.solc)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| CompileError::Solc(format!("{}: {err}", self.solc.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&input).await.map_err(|err| CompileError::Solc(err.to_string()))?;
        }
        let output =
            child.wait_with_output().await.map_err(|err| CompileError::Solc(err.to_string()))?;
        if output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompileError::Solc(stderr.trim().to_string()));
        }

        let output: SolcOutput = serde_json::from_slice(&output.stdout)
            .map_err(|err| CompileError::Decode(err.to_string()))?;
        artifact_from_output(request, output)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SolcOutput {
    #[serde(default)]
    pub errors: Vec<SolcDiagnostic>,
    #[serde(default)]
    pub contracts: BTreeMap<String, BTreeMap<String, SolcContract>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SolcDiagnostic {
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub formatted_message: Option<String>,
}

impl SolcDiagnostic {
    fn is_error(&self) -> bool {
        self.severity.eq_ignore_ascii_case("error")
    }

    fn render(&self) -> String {
        self.formatted_message.clone().unwrap_or_else(|| self.message.clone()).trim_end().to_string()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SolcContract {
    #[serde(default)]
    pub abi: Option<JsonAbi>,
    #[serde(default)]
    pub evm: Option<SolcEvm>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SolcEvm {
    #[serde(default)]
    pub bytecode: Option<SolcBytecode>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SolcBytecode {
    #[serde(default)]
    pub object: String,
}

/// Picks the artifact out of solc's output.
///
/// Errors abort; warnings are carried on the artifact. The contract named like the file
/// wins, otherwise the first contract by name.
pub(crate) fn artifact_from_output(
    request: &CompileRequest,
    mut output: SolcOutput,
) -> Result<CompiledArtifact, CompileError> {
    let (errors, warnings): (Vec<_>, Vec<_>) =
        output.errors.iter().partition(|diagnostic| diagnostic.is_error());
    if !errors.is_empty() {
        return Err(CompileError::Diagnostics(errors.iter().map(|d| d.render()).collect()));
    }
    let warnings: Vec<String> = warnings.iter().map(|d| d.render()).collect();
    for warning in &warnings {
        warn!(file = %request.file_name, "{warning}");
    }

    let mut contracts = output
        .contracts
        .remove(&request.file_name)
        .filter(|contracts| !contracts.is_empty())
        .ok_or_else(|| CompileError::NoContracts(request.file_name.clone()))?;

    let contract_name = if contracts.contains_key(request.stem()) {
        request.stem().to_string()
    } else {
        let first = contracts.keys().next().cloned().unwrap_or_default();
        debug!(expected = request.stem(), using = %first, "no contract named after the file");
        first
    };
    let contract = contracts
        .remove(&contract_name)
        .ok_or_else(|| CompileError::NoContracts(request.file_name.clone()))?;

    let object = contract
        .evm
        .and_then(|evm| evm.bytecode)
        .map(|bytecode| bytecode.object)
        .unwrap_or_default();
    let object = object.strip_prefix("0x").unwrap_or(&object);
    if object.is_empty() {
        return Err(CompileError::MissingBytecode(contract_name));
    }
    let bytecode: Bytes = format!("0x{object}")
        .parse()
        .map_err(|err| CompileError::Decode(format!("bytecode of `{contract_name}`: {err}")))?;
    let abi = contract.abi.unwrap_or_default();

    Ok(CompiledArtifact { abi, bytecode, contract_name, warnings })
}
