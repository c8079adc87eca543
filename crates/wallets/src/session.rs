//! The wallet session: canonical connectivity state for one provider.

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, ChainId, Signature, TxHash};
use alloy_rpc_types_eth::TransactionRequest;
use parking_lot::{Mutex, RwLock};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::{
    error::SessionError,
    provider::{ProviderEvent, WalletProvider},
};

/// A copy of the session state at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub connected: bool,
    pub has_signer: bool,
}

/// Changes published to session subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Connected { address: Address, chain_id: Option<ChainId> },
    AccountChanged { previous: Address, current: Address },
    ChainChanged(ChainId),
    Disconnected,
}

/// The account and chain an operation started with.
///
/// Passed back to [`WalletSession::revalidate`] before the operation finalizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionGuard {
    address: Address,
    chain_id: Option<ChainId>,
}

impl SessionGuard {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.chain_id
    }
}

/// Resets the in-flight connect flag when the request resolves or is dropped.
struct Connecting<'a>(&'a AtomicBool);

impl Drop for Connecting<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the connection to a wallet provider.
///
/// A single session is created per provider and shared by handle with every component
/// that needs it. Provider notifications are queued and applied whenever the state is
/// read, so an operation always sees account changes that happened before it finalizes.
#[derive(Debug)]
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    state: RwLock<SessionSnapshot>,
    connecting: AtomicBool,
    notifications: Mutex<Option<broadcast::Receiver<ProviderEvent>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl WalletSession {
    /// Creates a session for a detected provider.
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        let notifications = provider.subscribe();
        Self {
            provider: Some(provider),
            notifications: Mutex::new(Some(notifications)),
            ..Self::without_provider()
        }
    }

    /// A session for an environment where no provider was detected.
    pub fn without_provider() -> Self {
        Self {
            provider: None,
            state: RwLock::new(SessionSnapshot::default()),
            connecting: AtomicBool::new(false),
            notifications: Mutex::new(None),
            events: broadcast::channel(64).0,
        }
    }

    /// The underlying provider, used directly for read-only calls.
    pub fn provider(&self) -> Result<&Arc<dyn WalletProvider>, SessionError> {
        self.provider.as_ref().ok_or(SessionError::ProviderUnavailable)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Returns the current state after applying queued provider notifications.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.reconcile();
        *self.state.read()
    }

    /// Non-blocking read of the connected address.
    pub fn current_address(&self) -> Option<Address> {
        self.snapshot().address
    }

    /// Requests account access from the provider.
    ///
    /// When already connected this re-affirms the current account through the accounts
    /// query instead of prompting again.
    pub async fn connect(&self) -> Result<Address, SessionError> {
        let provider = self.provider()?.clone();

        if self.snapshot().connected {
            let accounts = provider.accounts().await?;
            self.on_accounts_changed(accounts);
            if let Some(address) = self.snapshot().address {
                trace!(%address, "re-affirmed wallet connection");
                return Ok(address);
            }
        }

        if self.connecting.swap(true, Ordering::AcqRel) {
            return Err(SessionError::ConnectionPending);
        }
        let _connecting = Connecting(&self.connecting);

        debug!("requesting wallet accounts");
        let accounts = provider.request_accounts().await?;
        let Some(&address) = accounts.first() else {
            return Err(SessionError::UserRejected);
        };
        let chain_id = match provider.chain_id().await {
            Ok(chain_id) => Some(chain_id),
            Err(err) => {
                warn!(%err, "failed to query chain id after connecting");
                None
            }
        };

        // drop notifications that predate this connection
        self.reconcile();
        {
            let mut state = self.state.write();
            state.address = Some(address);
            state.chain_id = chain_id.or(state.chain_id);
            state.connected = true;
            state.has_signer = provider.can_sign();
        }
        info!(%address, ?chain_id, "wallet connected");
        let _ = self.events.send(SessionEvent::Connected { address, chain_id });
        Ok(address)
    }

    /// Clears the local session. The provider keeps its own authorization.
    pub fn disconnect(&self) {
        let was_connected = {
            let mut state = self.state.write();
            let was_connected = state.connected;
            *state = SessionSnapshot { chain_id: state.chain_id, ..Default::default() };
            was_connected
        };
        if was_connected {
            info!("wallet disconnected");
            let _ = self.events.send(SessionEvent::Disconnected);
        }
    }

    /// Applies an `accountsChanged` notification.
    pub fn on_accounts_changed(&self, accounts: Vec<Address>) {
        let Some(&current) = accounts.first() else {
            self.disconnect();
            return;
        };
        let previous = {
            let mut state = self.state.write();
            if !state.connected {
                return;
            }
            let previous = state.address.replace(current);
            previous.filter(|previous| *previous != current)
        };
        if let Some(previous) = previous {
            info!(%previous, %current, "wallet account changed");
            let _ = self.events.send(SessionEvent::AccountChanged { previous, current });
        }
    }

    /// Applies a `chainChanged` notification.
    pub fn on_chain_changed(&self, chain_id: ChainId) {
        let changed = {
            let mut state = self.state.write();
            state.chain_id.replace(chain_id) != Some(chain_id)
        };
        if changed {
            info!(chain_id, "wallet network changed");
            let _ = self.events.send(SessionEvent::ChainChanged(chain_id));
        }
    }

    /// Drains queued provider notifications into the session state.
    pub fn reconcile(&self) {
        let mut events = Vec::new();
        {
            let mut notifications = self.notifications.lock();
            let Some(rx) = notifications.as_mut() else { return };
            loop {
                match rx.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed wallet notifications");
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Closed) => {
                        *notifications = None;
                        break;
                    }
                }
            }
        }
        for event in events {
            match event {
                ProviderEvent::AccountsChanged(accounts) => self.on_accounts_changed(accounts),
                ProviderEvent::ChainChanged(chain_id) => self.on_chain_changed(chain_id),
                ProviderEvent::Disconnected => self.disconnect(),
            }
        }
    }

    /// Captures the connected account at the start of an operation.
    pub fn guard(&self) -> Result<SessionGuard, SessionError> {
        let state = self.snapshot();
        match state.address {
            Some(address) if state.connected => {
                Ok(SessionGuard { address, chain_id: state.chain_id })
            }
            _ => Err(SessionError::NotConnected),
        }
    }

    /// Captures a guard for an operation that needs a signer, connecting once if needed.
    pub async fn signer_guard(&self) -> Result<SessionGuard, SessionError> {
        if !self.snapshot().has_signer {
            self.provider()?;
            self.connect().await?;
        }
        if !self.snapshot().has_signer {
            return Err(SessionError::SignerUnavailable);
        }
        self.guard()
    }

    /// Fails with [`SessionError::SessionInvalidated`] if the account moved since `guard`
    /// was taken.
    pub fn revalidate(&self, guard: &SessionGuard) -> Result<(), SessionError> {
        let actual = self.snapshot().address;
        if actual != Some(guard.address) {
            warn!(expected = %guard.address, ?actual, "session invalidated");
            return Err(SessionError::SessionInvalidated { expected: guard.address, actual });
        }
        Ok(())
    }

    /// Queries the chain id from the provider and records it.
    pub async fn fetch_chain_id(&self) -> Result<ChainId, SessionError> {
        let chain_id = self.provider()?.chain_id().await?;
        self.on_chain_changed(chain_id);
        Ok(chain_id)
    }

    /// Signs `message` with the connected account.
    pub async fn sign_message(&self, message: &[u8]) -> Result<(Address, Signature), SessionError> {
        let state = self.snapshot();
        if !state.has_signer {
            return Err(SessionError::SignerUnavailable);
        }
        let guard = self.guard()?;
        let signature = self.provider()?.sign_message(guard.address, message).await?;
        self.revalidate(&guard)?;
        Ok((guard.address, signature))
    }

    /// Submits `tx` from the guarded account.
    ///
    /// The account is re-validated right before submission. Once the provider accepted
    /// the transaction nothing can undo it, so no check follows.
    pub async fn send_transaction(
        &self,
        guard: &SessionGuard,
        tx: TransactionRequest,
    ) -> Result<TxHash, SessionError> {
        self.revalidate(guard)?;
        let tx = tx.with_from(guard.address);
        let hash = self.provider()?.send_transaction(tx).await?;
        debug!(%hash, from = %guard.address, "transaction accepted by provider");
        Ok(hash)
    }
}
