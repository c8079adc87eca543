//! Wire types of the persistence backend.

use alloy_json_abi::JsonAbi;
use serde::{Deserialize, Serialize};
use vellum_common::CanonicalAddress;

/// A deployed contract as stored by the persistence backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContractRef {
    pub contract_address: CanonicalAddress,
    pub abi: JsonAbi,
    /// Lowercase network name, e.g. `sepolia`.
    pub network: String,
    /// Display name chosen by the user.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Name of the contract in its source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_name_sol: Option<String>,
    /// Identifier assigned by the backend once the reference is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firestore_id: Option<String>,
    /// Server-side creation timestamp, in whatever shape the store returns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<serde_json::Value>,
}

impl DeployedContractRef {
    /// Whether the backend has accepted this reference.
    pub fn is_persisted(&self) -> bool {
        self.firestore_id.is_some()
    }
}

/// The signed part of every mutating backend request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPayload {
    /// The canonical message that was signed.
    pub signed_message: String,
    /// `0x`-prefixed 65-byte signature.
    pub signature: String,
    pub user_address: CanonicalAddress,
}

/// Body of `POST /save-contract-reference`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub contract_data: DeployedContractRef,
    #[serde(flatten)]
    pub auth: SignedPayload,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub message: String,
    pub firestore_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}
