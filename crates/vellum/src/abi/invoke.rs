use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, ChainId, U256};
use alloy_rpc_types_eth::TransactionRequest;
use std::sync::Arc;
use vellum_common::{
    ErrorKind,
    units::{AmountError, parse_native_amount},
};
use vellum_wallets::{ProviderError, SessionError, WalletSession};

use super::{AbiError, AbiRegistry, FunctionKind, render};
use crate::tx::{TrackedTransaction, TransactionTracker};

/// Errors invoking a deployed contract.
#[derive(Clone, Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Abi(#[from] AbiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error("`{0}` modifies state, send a transaction instead")]
    NotReadable(String),
    #[error("`{0}` is read-only, call it instead")]
    NotWritable(String),
    #[error("`{0}` is not payable and cannot receive value")]
    NotPayable(String),
    #[error("wallet is on chain {actual}, the contract lives on chain {expected}")]
    WrongNetwork { expected: ChainId, actual: ChainId },
    #[error("execution reverted{}", .0.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    CallReverted(Option<String>),
    #[error(transparent)]
    Provider(ProviderError),
}

impl InvokeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Abi(err) => err.kind(),
            Self::Session(err) => err.kind(),
            Self::Amount(_) | Self::NotReadable(_) | Self::NotWritable(_) | Self::NotPayable(_) => {
                ErrorKind::ArgumentEncoding
            }
            Self::WrongNetwork { .. } => ErrorKind::WrongNetwork,
            Self::CallReverted(_) => ErrorKind::CallReverted,
            Self::Provider(err) => err.kind(),
        }
    }
}

impl From<ProviderError> for InvokeError {
    fn from(err: ProviderError) -> Self {
        if err.is_revert() {
            Self::CallReverted(err.revert_reason())
        } else {
            Self::Session(err.into())
        }
    }
}

/// Calls and transacts against one deployed contract through the session.
#[derive(Debug)]
pub struct ContractInvoker {
    address: Address,
    chain_id: ChainId,
    registry: AbiRegistry,
    session: Arc<WalletSession>,
    tracker: Arc<TransactionTracker>,
}

impl ContractInvoker {
    pub fn new(
        address: Address,
        chain_id: ChainId,
        registry: AbiRegistry,
        session: Arc<WalletSession>,
        tracker: Arc<TransactionTracker>,
    ) -> Self {
        Self { address, chain_id, registry, session, tracker }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The chain the contract is deployed on.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn registry(&self) -> &AbiRegistry {
        &self.registry
    }

    /// Mutable access to the argument slots.
    pub fn registry_mut(&mut self) -> &mut AbiRegistry {
        &mut self.registry
    }

    /// Runs the read function `key` with `args` and renders every return value.
    ///
    /// Arguments are encoded before the provider is touched.
    pub async fn invoke_read<S: AsRef<str>>(
        &self,
        key: &str,
        args: &[S],
    ) -> Result<Vec<String>, InvokeError> {
        let function = self.registry.function(key)?;
        if !function.kind.is_read() {
            return Err(InvokeError::NotReadable(function.signature()));
        }
        let input = function.encode_call(args)?;

        let provider = self.session.provider()?;
        let tx = TransactionRequest::default().with_to(self.address).with_input(input);
        trace!(to = %self.address, function = %function.signature(), "eth_call");
        let output = provider.call(tx).await.map_err(|err| {
            debug!(function = %function.signature(), %err, "call failed");
            InvokeError::from(err)
        })?;

        let values = function.decode_output(&output)?;
        Ok(values.iter().map(render).collect())
    }

    /// Runs the read function `key` with the values stored in its argument slots.
    pub async fn invoke_read_slots(&self, key: &str) -> Result<Vec<String>, InvokeError> {
        let args = self.registry.function(key)?.filled_args()?;
        self.invoke_read(key, &args).await
    }

    /// Sends a transaction to the write function `key`.
    ///
    /// `value` is a decimal native amount and is only accepted by payable functions.
    pub async fn invoke_write<S: AsRef<str>>(
        &self,
        key: &str,
        args: &[S],
        value: Option<&str>,
    ) -> Result<TrackedTransaction, InvokeError> {
        let function = self.registry.function(key)?;
        let value = match (function.kind, value) {
            (FunctionKind::Read, _) => return Err(InvokeError::NotWritable(function.signature())),
            (FunctionKind::Write, Some(_)) => {
                return Err(InvokeError::NotPayable(function.signature()));
            }
            (_, Some(value)) => parse_native_amount(value)?,
            (_, None) => U256::ZERO,
        };
        let input = function.encode_call(args)?;

        let guard = self.session.signer_guard().await?;
        let actual = self.session.fetch_chain_id().await?;
        if actual != self.chain_id {
            return Err(InvokeError::WrongNetwork { expected: self.chain_id, actual });
        }

        let mut tx = TransactionRequest::default().with_to(self.address).with_input(input);
        if !value.is_zero() {
            tx = tx.with_value(value);
        }
        let hash = self.session.send_transaction(&guard, tx).await?;
        info!(%hash, to = %self.address, function = %function.signature(), %value, "transaction sent");
        Ok(self.tracker.track(hash))
    }
}
