//! Deployment of compiled artifacts through the wallet session.

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, ChainId, TxHash};
use alloy_rpc_types_eth::TransactionRequest;
use std::sync::Arc;
use vellum_backend::CompiledArtifact;
use vellum_common::ErrorKind;
use vellum_wallets::{SessionError, SessionGuard, WalletSession};

use crate::{
    abi::{AbiError, encode_deploy_code},
    tx::{TrackError, TrackedTransaction, TransactionRecord, TransactionTracker, TxStatus},
};

#[derive(Clone, Debug, thiserror::Error)]
pub enum DeployError {
    #[error("wallet is on chain {actual}, expected chain {expected}")]
    WrongNetwork { expected: ChainId, actual: ChainId },
    #[error("invalid constructor arguments: {0}")]
    Encoding(#[from] AbiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("deployment transaction {hash} reverted")]
    Reverted { hash: TxHash },
    #[error("deployment transaction {hash} failed: {reason}")]
    Failed { hash: TxHash, reason: String },
    #[error(transparent)]
    Tracking(#[from] TrackError),
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WrongNetwork { .. } => ErrorKind::WrongNetwork,
            Self::Encoding(_) => ErrorKind::ArgumentEncoding,
            Self::Session(err) => err.kind(),
            Self::Reverted { .. } => ErrorKind::CallReverted,
            Self::Failed { .. } | Self::Tracking(_) => ErrorKind::Provider,
        }
    }
}

/// A submitted deployment.
#[derive(Clone, Debug)]
pub struct DeploymentHandle {
    guard: SessionGuard,
    chain_id: ChainId,
    tx: TrackedTransaction,
}

impl DeploymentHandle {
    pub fn transaction_hash(&self) -> TxHash {
        self.tx.hash()
    }

    /// The deploying account.
    pub fn from(&self) -> Address {
        self.guard.address()
    }

    /// The session state the deployment was sent under.
    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn transaction(&self) -> &TrackedTransaction {
        &self.tx
    }

    pub fn status(&self) -> TxStatus {
        self.tx.status()
    }

    /// The contract address, if the provider already reported it.
    pub fn known_contract_address(&self) -> Option<Address> {
        self.tx.record().contract_address()
    }

    /// Resolves as soon as the contract address is known, before full confirmation.
    pub async fn contract_address(&self) -> Result<Address, DeployError> {
        let record = self
            .tx
            .wait_for(|record| record.contract_address().is_some() || record.status.is_terminal())
            .await
            .map_err(|record| TrackError::Lost { hash: record.hash, status: record.status })?;
        match record.contract_address() {
            Some(address) if !matches!(record.status, TxStatus::Failed | TxStatus::Reverted) => {
                Ok(address)
            }
            _ => Err(terminal_error(&record)),
        }
    }

    /// Waits for the confirmation threshold. Reverts and drops are errors.
    pub async fn wait_for_confirmation(&self) -> Result<TransactionRecord, DeployError> {
        let record = self.tx.wait().await?;
        match record.status {
            TxStatus::Confirmed => Ok(record),
            _ => Err(terminal_error(&record)),
        }
    }
}

fn terminal_error(record: &TransactionRecord) -> DeployError {
    match record.status {
        TxStatus::Reverted => DeployError::Reverted { hash: record.hash },
        _ => DeployError::Failed {
            hash: record.hash,
            reason: record.error.clone().unwrap_or_else(|| "no contract address reported".into()),
        },
    }
}

/// Turns compiled artifacts into creation transactions.
#[derive(Clone, Debug)]
pub struct DeploymentOrchestrator {
    session: Arc<WalletSession>,
    tracker: Arc<TransactionTracker>,
}

impl DeploymentOrchestrator {
    pub fn new(session: Arc<WalletSession>, tracker: Arc<TransactionTracker>) -> Self {
        Self { session, tracker }
    }

    /// Deploys `artifact` with `args` on `expected_chain_id`.
    ///
    /// Nothing is sent unless the wallet is on the expected chain. Failures are never retried.
    pub async fn deploy<S: AsRef<str>>(
        &self,
        artifact: &CompiledArtifact,
        args: &[S],
        expected_chain_id: ChainId,
    ) -> Result<DeploymentHandle, DeployError> {
        let guard = self.session.signer_guard().await?;

        let actual = self.session.fetch_chain_id().await?;
        if actual != expected_chain_id {
            warn!(expected = expected_chain_id, actual, "refusing to deploy on the wrong network");
            return Err(DeployError::WrongNetwork { expected: expected_chain_id, actual });
        }

        let code = encode_deploy_code(&artifact.abi, &artifact.bytecode, args)?;
        let tx = TransactionRequest::default().with_deploy_code(code);
        let hash = self.session.send_transaction(&guard, tx).await?;
        info!(%hash, contract = %artifact.contract_name, from = %guard.address(), "deployment sent");

        Ok(DeploymentHandle { guard, chain_id: actual, tx: self.tracker.track(hash) })
    }
}
