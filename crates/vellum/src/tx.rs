//! Per-transaction state machine from submission to finality.

use alloy_primitives::{Address, TxHash};
use futures::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::{sync::watch, task::AbortHandle};
use vellum_wallets::{TxReceipt, TxUpdate, WalletProvider};

/// Confirmations required when nothing else is configured.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TxStatus {
    /// Accepted by the wallet, not yet seen by the node.
    Submitted,
    /// Known to the node, waiting for the confirmation threshold.
    Pending,
    Confirmed,
    Reverted,
    /// Dropped or refused before the node reported it.
    Failed,
}

impl TxStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Reverted | Self::Failed)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What is known about one submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub status: TxStatus,
    pub receipt: Option<TxReceipt>,
    /// Sender and nonce, once the node reported the transaction.
    pub sender: Option<(Address, u64)>,
    /// Why tracking failed or was lost.
    pub error: Option<String>,
    history: Vec<TxStatus>,
}

impl TransactionRecord {
    pub fn submitted(hash: TxHash) -> Self {
        Self {
            hash,
            status: TxStatus::Submitted,
            receipt: None,
            sender: None,
            error: None,
            history: vec![TxStatus::Submitted],
        }
    }

    /// Every status this record went through, oldest first.
    pub fn history(&self) -> &[TxStatus] {
        &self.history
    }

    /// The deployed contract's address: from the receipt, else derived from sender and nonce.
    pub fn contract_address(&self) -> Option<Address> {
        self.receipt
            .as_ref()
            .and_then(|receipt| receipt.contract_address)
            .or_else(|| self.sender.map(|(from, nonce)| from.create(nonce)))
    }

    fn transition(&mut self, status: TxStatus) {
        self.status = status;
        self.history.push(status);
    }

    /// Applies a provider update. Returns `false` if the record did not change.
    ///
    /// Terminal records are never modified. A receipt on a submitted record passes through
    /// `Pending` first; a drop after `Pending` leaves the status as is and records the error.
    pub fn apply(&mut self, update: TxUpdate) -> bool {
        if self.status.is_terminal() {
            trace!(hash = %self.hash, status = %self.status, ?update, "ignoring update for final transaction");
            return false;
        }
        match update {
            TxUpdate::Seen { from, nonce } => {
                let changed = self.sender != Some((from, nonce));
                self.sender = Some((from, nonce));
                if self.status == TxStatus::Submitted {
                    self.transition(TxStatus::Pending);
                    return true;
                }
                changed
            }
            TxUpdate::Final(receipt) => {
                if self.status == TxStatus::Submitted {
                    self.transition(TxStatus::Pending);
                }
                let status = if receipt.status { TxStatus::Confirmed } else { TxStatus::Reverted };
                self.receipt = Some(receipt);
                self.transition(status);
                true
            }
            TxUpdate::Dropped(reason) => {
                if self.status == TxStatus::Submitted {
                    self.transition(TxStatus::Failed);
                }
                self.error = Some(reason);
                true
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TrackError {
    #[error("lost track of transaction {hash} while {status}")]
    Lost { hash: TxHash, status: TxStatus },
    #[error("transaction {0} is not tracked")]
    NotTracked(TxHash),
}

/// Handle to one tracked transaction.
#[derive(Clone, Debug)]
pub struct TrackedTransaction {
    hash: TxHash,
    rx: watch::Receiver<TransactionRecord>,
    task: Option<AbortHandle>,
}

impl TrackedTransaction {
    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// The current record.
    pub fn record(&self) -> TransactionRecord {
        self.rx.borrow().clone()
    }

    pub fn status(&self) -> TxStatus {
        self.rx.borrow().status
    }

    /// Receives every change of the record.
    pub fn subscribe(&self) -> watch::Receiver<TransactionRecord> {
        self.rx.clone()
    }

    /// Waits until `predicate` holds for the record.
    ///
    /// If tracking stops first, returns the last record as an error.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&TransactionRecord) -> bool,
    ) -> Result<TransactionRecord, TransactionRecord> {
        let mut rx = self.rx.clone();
        let outcome = rx.wait_for(predicate).await.map(|record| record.clone());
        outcome.map_err(|_| rx.borrow().clone())
    }

    /// Waits for a terminal status.
    pub async fn wait(&self) -> Result<TransactionRecord, TrackError> {
        self.wait_for(|record| record.status.is_terminal())
            .await
            .map_err(|record| TrackError::Lost { hash: self.hash, status: record.status })
    }

    fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Drives tracked transactions to finality through a provider.
///
/// Every transaction gets its own watch task and record; nothing is shared between them.
#[derive(Debug)]
pub struct TransactionTracker {
    provider: Arc<dyn WalletProvider>,
    confirmations: u64,
    tracked: Arc<Mutex<HashMap<TxHash, TrackedTransaction>>>,
}

impl TransactionTracker {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self::with_confirmations(provider, DEFAULT_CONFIRMATIONS)
    }

    pub fn with_confirmations(provider: Arc<dyn WalletProvider>, confirmations: u64) -> Self {
        Self { provider, confirmations: confirmations.max(1), tracked: Default::default() }
    }

    pub fn confirmations(&self) -> u64 {
        self.confirmations
    }

    /// Starts tracking `hash` with a single confirmation wait.
    ///
    /// Tracking the same hash twice returns the existing handle. A transaction is forgotten
    /// once its record is final.
    pub fn track(&self, hash: TxHash) -> TrackedTransaction {
        let mut tracked = self.tracked.lock();
        if let Some(existing) = tracked.get(&hash) {
            return existing.clone();
        }

        let (tx, rx) = watch::channel(TransactionRecord::submitted(hash));
        let updates = match self.provider.watch_transaction(hash, self.confirmations) {
            Ok(updates) => updates,
            Err(err) => {
                warn!(%hash, %err, "failed to watch transaction");
                tx.send_modify(|record| {
                    record.apply(TxUpdate::Dropped(err.to_string()));
                });
                return TrackedTransaction { hash, rx, task: None };
            }
        };

        let registry = Arc::clone(&self.tracked);
        let task = tokio::spawn(async move {
            let mut updates = updates;
            while let Some(update) = updates.next().await {
                let mut record = tx.borrow().clone();
                let changed = record.apply(update);
                let terminal = record.status.is_terminal();
                if terminal {
                    registry.lock().remove(&hash);
                }
                if changed {
                    tx.send_replace(record);
                }
                if terminal {
                    debug!(%hash, status = %tx.borrow().status, "transaction final");
                    return;
                }
            }
            registry.lock().remove(&hash);
            tx.send_if_modified(|record| {
                record.apply(TxUpdate::Dropped("confirmation watch ended".into()))
            });
        });

        let handle = TrackedTransaction { hash, rx, task: Some(task.abort_handle()) };
        tracked.insert(hash, handle.clone());
        trace!(%hash, confirmations = self.confirmations, "tracking transaction");
        handle
    }

    /// The handle of a transaction that is still being tracked.
    pub fn get(&self, hash: &TxHash) -> Option<TrackedTransaction> {
        self.tracked.lock().get(hash).cloned()
    }

    /// Number of transactions not yet final.
    pub fn len(&self) -> usize {
        self.tracked.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.lock().is_empty()
    }

    /// Stops tracking `hash`. The transaction itself is unaffected.
    pub fn cancel(&self, hash: &TxHash) -> Result<TransactionRecord, TrackError> {
        let tracked = self.tracked.lock().remove(hash).ok_or(TrackError::NotTracked(*hash))?;
        tracked.abort();
        debug!(%hash, "stopped tracking transaction");
        Ok(tracked.record())
    }
}
