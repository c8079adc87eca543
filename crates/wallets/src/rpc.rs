//! A provider backed by a JSON-RPC node, optionally signing with a local key.

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes, ChainId, Signature, TxHash};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::broadcast;
use url::Url;

use crate::{
    error::ProviderError,
    provider::{ProviderEvent, TxUpdate, WalletProvider, watch_with_provider},
};

/// Builds a type-erased HTTP provider for `rpc_url`.
pub fn http_provider(rpc_url: &str) -> Result<DynProvider, ProviderError> {
    let url = parse_url(rpc_url)?;
    Ok(ProviderBuilder::new().connect_http(url).erased())
}

fn parse_url(rpc_url: &str) -> Result<Url, ProviderError> {
    rpc_url
        .parse()
        .map_err(|err| ProviderError::Transport(format!("invalid rpc url `{rpc_url}`: {err}")))
}

/// Wallet provider talking straight to a node.
///
/// With a [`PrivateKeySigner`] every transaction and message is signed locally; without
/// one the node's own unlocked accounts are used, as on development nodes.
#[derive(Clone, Debug)]
pub struct RpcWalletProvider {
    provider: DynProvider,
    signer: Option<PrivateKeySigner>,
    events: broadcast::Sender<ProviderEvent>,
}

impl RpcWalletProvider {
    pub fn new(rpc_url: &str, signer: Option<PrivateKeySigner>) -> Result<Self, ProviderError> {
        let url = parse_url(rpc_url)?;
        let provider = match &signer {
            Some(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::new(signer.clone()))
                .connect_http(url)
                .erased(),
            None => ProviderBuilder::new().connect_http(url).erased(),
        };
        Ok(Self { provider, signer, events: broadcast::channel(16).0 })
    }

    pub fn signer(&self) -> Option<&PrivateKeySigner> {
        self.signer.as_ref()
    }

    pub fn inner(&self) -> &DynProvider {
        &self.provider
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    fn can_sign(&self) -> bool {
        true
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.accounts().await
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        match &self.signer {
            Some(signer) => Ok(vec![signer.address()]),
            None => Ok(self.provider.get_accounts().await?),
        }
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn sign_message(
        &self,
        signer: Address,
        message: &[u8],
    ) -> Result<Signature, ProviderError> {
        match &self.signer {
            Some(local) if local.address() == signer => local
                .sign_message(message)
                .await
                .map_err(|err| ProviderError::Transport(err.to_string())),
            Some(local) => Err(ProviderError::unauthorized(format!(
                "{signer} is not the local signer {}",
                local.address()
            ))),
            None => {
                let raw: Bytes = self
                    .provider
                    .raw_request("personal_sign".into(), (Bytes::copy_from_slice(message), signer))
                    .await?;
                Signature::try_from(raw.as_ref())
                    .map_err(|err| ProviderError::Transport(format!("invalid signature: {err}")))
            }
        }
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError> {
        let pending = self.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, ProviderError> {
        Ok(self.provider.call(tx).await?)
    }

    fn watch_transaction(
        &self,
        hash: TxHash,
        confirmations: u64,
    ) -> Result<BoxStream<'static, TxUpdate>, ProviderError> {
        Ok(watch_with_provider(self.provider.clone(), hash, confirmations))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
