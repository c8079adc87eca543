use alloy_primitives::{Address, Bytes, ChainId, TxHash};
use alloy_rpc_types_eth::TransactionRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account and chain currently exposed by the page's wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub address: Address,
    pub chain_id: ChainId,
}

impl Connection {
    pub fn new(address: Address, chain_id: ChainId) -> Self {
        Self { address, chain_id }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrowserTransaction {
    pub id: Uuid,
    pub request: TransactionRequest,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub hash: Option<TxHash>,
    pub error: Option<String>,
    /// EIP-1193 error code, when the wallet reported one.
    #[serde(default)]
    pub code: Option<i64>,
}

/// A `personal_sign` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRequest {
    pub id: Uuid,
    pub address: Address,
    pub message: Bytes,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignResponse {
    pub id: Uuid,
    pub signature: Option<Bytes>,
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

/// Envelope of every `/api` response.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum BrowserApiResponse<T> {
    Ok(T),
    Error { message: String },
}

impl<T> BrowserApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}

pub(crate) trait Identified {
    fn id(&self) -> Uuid;
}

impl Identified for BrowserTransaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Identified for SignRequest {
    fn id(&self) -> Uuid {
        self.id
    }
}
