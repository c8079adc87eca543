use alloy_primitives::{Address, Bytes, ChainId, Signature, TxHash};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionRequest;
use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::broadcast;

use crate::{
    error::ProviderError,
    provider::{ProviderEvent, TxUpdate, WalletProvider, watch_with_provider},
    wallet_browser::server::BrowserWalletServer,
};

#[async_trait]
impl WalletProvider for BrowserWalletServer {
    fn can_sign(&self) -> bool {
        true
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        if self.state().get_connection().is_none() {
            info!(url = %self.url(), "open the page to connect your wallet");
        }
        let connection = self.wait_for_connection().await?;
        Ok(vec![connection.address])
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.get_connection().map(|connection| connection.address).into_iter().collect())
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        if let Some(connection) = self.get_connection() {
            return Ok(connection.chain_id);
        }
        match self.reads() {
            Some(provider) => Ok(provider.get_chain_id().await?),
            None => Err(ProviderError::unauthorized("browser wallet is not connected")),
        }
    }

    async fn sign_message(
        &self,
        signer: Address,
        message: &[u8],
    ) -> Result<Signature, ProviderError> {
        match self.get_connection() {
            Some(connection) if connection.address == signer => {}
            Some(connection) => {
                return Err(ProviderError::unauthorized(format!(
                    "{signer} is not the connected account {}",
                    connection.address
                )));
            }
            None => return Err(ProviderError::unauthorized("browser wallet is not connected")),
        }
        Ok(self.request_signing(signer, Bytes::copy_from_slice(message)).await?)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError> {
        Ok(self.request_transaction(tx).await?)
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, ProviderError> {
        let provider = self.reads().ok_or(ProviderError::Unsupported("eth_call without an rpc url"))?;
        Ok(provider.call(tx).await?)
    }

    fn watch_transaction(
        &self,
        hash: TxHash,
        confirmations: u64,
    ) -> Result<BoxStream<'static, TxUpdate>, ProviderError> {
        let provider = self
            .reads()
            .ok_or(ProviderError::Unsupported("watching transactions without an rpc url"))?;
        Ok(watch_with_provider(provider.clone(), hash, confirmations))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.state().subscribe()
    }
}
