//! The wallet provider surface consumed by the session and the core components.

use alloy_consensus::Transaction as _;
use alloy_network::{ReceiptResponse, TransactionResponse as _};
use alloy_primitives::{Address, BlockNumber, Bytes, ChainId, Signature, TxHash};
use alloy_provider::{DynProvider, PendingTransactionBuilder, Provider};
use alloy_rpc_types_eth::TransactionRequest;
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use serde::Serialize;
use std::fmt;
use tokio::sync::{broadcast, mpsc};

use crate::error::ProviderError;

/// Notifications pushed by a provider outside of any request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The set of exposed accounts changed. Empty means the wallet locked or revoked access.
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
    Disconnected,
}

/// A mined transaction, as far as this crate cares about it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<BlockNumber>,
    pub contract_address: Option<Address>,
    /// `true` when execution succeeded.
    pub status: bool,
    pub gas_used: u64,
}

impl TxReceipt {
    pub fn from_rpc<R: ReceiptResponse>(receipt: &R) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            contract_address: receipt.contract_address(),
            status: receipt.status(),
            gas_used: receipt.gas_used(),
        }
    }
}

/// Progress of a submitted transaction, as observed by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxUpdate {
    /// The provider knows the transaction. Sender and nonce are fixed from here on.
    Seen { from: Address, nonce: u64 },
    /// The confirmation threshold was reached.
    Final(TxReceipt),
    /// The transaction was refused or dropped, or the watch itself failed.
    Dropped(String),
}

/// An EIP-1193 style wallet provider.
///
/// Implementations are shared behind an `Arc` by every component of a session.
#[async_trait]
pub trait WalletProvider: Send + Sync + fmt::Debug {
    /// Whether accounts exposed by this provider can sign messages and transactions.
    fn can_sign(&self) -> bool;

    /// `eth_requestAccounts`: asks the user for account access.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// `eth_accounts`: accounts already exposed, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;

    async fn chain_id(&self) -> Result<ChainId, ProviderError>;

    /// `personal_sign` of `message` by `signer`.
    async fn sign_message(
        &self,
        signer: Address,
        message: &[u8],
    ) -> Result<Signature, ProviderError>;

    /// `eth_sendTransaction`. Resolves once the provider accepted the transaction.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError>;

    /// `eth_call` against the latest block.
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, ProviderError>;

    /// Issues a single wait for `confirmations` blocks on `hash` and streams its progress.
    ///
    /// The stream ends after [`TxUpdate::Final`] or [`TxUpdate::Dropped`].
    fn watch_transaction(
        &self,
        hash: TxHash,
        confirmations: u64,
    ) -> Result<BoxStream<'static, TxUpdate>, ProviderError>;

    /// Subscribes to account and chain notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Watches `hash` through an alloy provider.
///
/// The transaction is looked up once to report its sender and nonce, then a single
/// confirmation wait is issued.
pub(crate) fn watch_with_provider(
    provider: DynProvider,
    hash: TxHash,
    confirmations: u64,
) -> BoxStream<'static, TxUpdate> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        match provider.get_transaction_by_hash(hash).await {
            Ok(Some(found)) => {
                let _ = tx.send(TxUpdate::Seen { from: found.from(), nonce: found.nonce() });
            }
            Ok(None) => trace!(%hash, "transaction not yet known to the node"),
            Err(err) => debug!(%hash, %err, "failed to look up transaction"),
        }

        let pending = PendingTransactionBuilder::new(provider.root().clone(), hash)
            .with_required_confirmations(confirmations.max(1));
        let update = match pending.get_receipt().await {
            Ok(receipt) => TxUpdate::Final(TxReceipt::from_rpc(&receipt)),
            Err(err) => TxUpdate::Dropped(err.to_string()),
        };
        let _ = tx.send(update);
    });

    Box::pin(stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|update| (update, rx)) }))
}
