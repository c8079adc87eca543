//! The compiler collaborator: turns a Solidity source file into a deployable artifact.

use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CompileError;

mod http;
pub use http::HttpCompiler;

mod solc;
pub use solc::SolcCompiler;

/// A source file to compile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    pub file_name: String,
    pub source_code: String,
}

impl CompileRequest {
    pub fn new(file_name: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self { file_name: file_name.into(), source_code: source_code.into() }
    }

    /// The file name without its `.sol` extension, the preferred contract name.
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name).file_stem().and_then(|s| s.to_str()).unwrap_or(&self.file_name)
    }
}

/// Output of a successful compilation. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledArtifact {
    pub abi: JsonAbi,
    /// Creation bytecode.
    pub bytecode: Bytes,
    pub contract_name: String,
    /// Non-blocking diagnostics, already formatted.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Anything that can compile a single Solidity file.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, request: &CompileRequest) -> Result<CompiledArtifact, CompileError>;
}
