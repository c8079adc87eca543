//! An in-memory [`WalletProvider`] that records every call.

use alloy_primitives::{Address, Bytes, ChainId, Signature, TxHash, TxKind, keccak256};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use parking_lot::Mutex;
use std::{collections::HashMap, time::Duration};
use tokio::sync::{broadcast, mpsc};
use vellum_wallets::{ProviderError, ProviderEvent, TxReceipt, TxUpdate, WalletProvider};

/// A provider call, as recorded by [`MockProvider`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    RequestAccounts,
    Accounts,
    ChainId,
    SignMessage { signer: Address, message: Vec<u8> },
    SendTransaction(Box<TransactionRequest>),
    Call(Box<TransactionRequest>),
    WatchTransaction { hash: TxHash, confirmations: u64 },
}

/// How watches resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WatchMode {
    /// Report `Seen` and a final receipt with the given status right away.
    Auto { success: bool },
    /// Report `Dropped` right away.
    Drop,
    /// Wait for updates pushed through [`MockProvider::push_update`].
    Manual,
}

#[derive(Clone, Copy, Debug)]
struct SentTx {
    from: Address,
    nonce: u64,
    create: bool,
}

#[derive(Debug)]
struct MockState {
    calls: Vec<MockCall>,
    account: Address,
    authorized: bool,
    chain_id: ChainId,
    connect_error: Option<ProviderError>,
    connect_delay: Option<Duration>,
    sign_error: Option<ProviderError>,
    send_error: Option<ProviderError>,
    call_result: Result<Bytes, ProviderError>,
    on_sign: Option<ProviderEvent>,
    on_send: Option<ProviderEvent>,
    watch: WatchMode,
    nonce: u64,
    sent: HashMap<TxHash, SentTx>,
    watchers: HashMap<TxHash, mpsc::UnboundedSender<TxUpdate>>,
}

/// A wallet provider for tests.
///
/// Signs with a real [`PrivateKeySigner`], so signatures recover to [`address`](Self::address).
#[derive(Debug)]
pub struct MockProvider {
    signer: PrivateKeySigner,
    can_sign: bool,
    state: Mutex<MockState>,
    events: broadcast::Sender<ProviderEvent>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// A signing provider with a random key on Sepolia.
    pub fn new() -> Self {
        Self::with_signer(PrivateKeySigner::random())
    }

    pub fn with_signer(signer: PrivateKeySigner) -> Self {
        Self {
            can_sign: true,
            state: Mutex::new(MockState {
                calls: Vec::new(),
                account: signer.address(),
                authorized: false,
                chain_id: 11155111,
                connect_error: None,
                connect_delay: None,
                sign_error: None,
                send_error: None,
                call_result: Ok(Bytes::new()),
                on_sign: None,
                on_send: None,
                watch: WatchMode::Auto { success: true },
                nonce: 0,
                sent: HashMap::new(),
                watchers: HashMap::new(),
            }),
            signer,
            events: broadcast::channel(64).0,
        }
    }

    pub fn on_chain(self, chain_id: ChainId) -> Self {
        self.state.lock().chain_id = chain_id;
        self
    }

    /// Exposes accounts without the ability to sign.
    pub fn read_only(mut self) -> Self {
        self.can_sign = false;
        self
    }

    /// Starts with the account already authorized, like a wallet that remembers the site.
    pub fn authorized(self) -> Self {
        self.state.lock().authorized = true;
        self
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn reject_connect(&self) {
        self.set_connect_error(ProviderError::user_rejected("User rejected the request."));
    }

    pub fn set_connect_error(&self, err: ProviderError) {
        self.state.lock().connect_error = Some(err);
    }

    /// Delays `eth_requestAccounts`, leaving the connect request outstanding.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.state.lock().connect_delay = Some(delay);
    }

    pub fn reject_signing(&self) {
        self.state.lock().sign_error =
            Some(ProviderError::user_rejected("User denied message signature."));
    }

    pub fn set_send_error(&self, err: ProviderError) {
        self.state.lock().send_error = Some(err);
    }

    pub fn set_call_result(&self, result: Result<Bytes, ProviderError>) {
        self.state.lock().call_result = result;
    }

    /// Emits `event` while the next signature is being produced.
    pub fn emit_on_sign(&self, event: ProviderEvent) {
        self.state.lock().on_sign = Some(event);
    }

    /// Emits `event` while the next transaction is being submitted.
    pub fn emit_on_send(&self, event: ProviderEvent) {
        self.state.lock().on_send = Some(event);
    }

    /// Watches report a reverted receipt.
    pub fn revert_transactions(&self) {
        self.state.lock().watch = WatchMode::Auto { success: false };
    }

    /// Watches report the transaction as dropped.
    pub fn drop_transactions(&self) {
        self.state.lock().watch = WatchMode::Drop;
    }

    /// Watches stay open until updates are pushed with [`push_update`](Self::push_update).
    pub fn manual_watches(&self) {
        self.state.lock().watch = WatchMode::Manual;
    }

    /// Sends `update` to the open watch of `hash`. Returns `false` if there is none.
    pub fn push_update(&self, hash: TxHash, update: TxUpdate) -> bool {
        let state = self.state.lock();
        state.watchers.get(&hash).is_some_and(|tx| tx.send(update).is_ok())
    }

    /// Closes the open watch of `hash` without a final update.
    pub fn close_watch(&self, hash: TxHash) {
        self.state.lock().watchers.remove(&hash);
    }

    /// The `Seen` update for a transaction sent through this provider.
    pub fn seen(&self, hash: TxHash) -> Option<TxUpdate> {
        let state = self.state.lock();
        state.sent.get(&hash).map(|sent| TxUpdate::Seen { from: sent.from, nonce: sent.nonce })
    }

    /// The receipt this provider reports for a transaction it sent.
    pub fn receipt(&self, hash: TxHash, success: bool) -> Option<TxReceipt> {
        let state = self.state.lock();
        state.sent.get(&hash).map(|sent| receipt_for(hash, sent, success))
    }

    /// Pushes a provider notification and applies it to the mock's own state.
    pub fn emit(&self, event: ProviderEvent) {
        {
            let mut state = self.state.lock();
            match &event {
                ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                    Some(account) => state.account = *account,
                    None => state.authorized = false,
                },
                ProviderEvent::ChainChanged(chain_id) => state.chain_id = *chain_id,
                ProviderEvent::Disconnected => state.authorized = false,
            }
        }
        let _ = self.events.send(event);
    }

    fn record(&self, call: MockCall) {
        self.state.lock().calls.push(call);
    }
}

fn receipt_for(hash: TxHash, sent: &SentTx, success: bool) -> TxReceipt {
    TxReceipt {
        transaction_hash: hash,
        block_number: Some(1),
        contract_address: sent.create.then(|| sent.from.create(sent.nonce)),
        status: success,
        gas_used: 21_000,
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    fn can_sign(&self) -> bool {
        self.can_sign
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.record(MockCall::RequestAccounts);
        let delay = self.state.lock().connect_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock();
        if let Some(err) = state.connect_error.clone() {
            return Err(err);
        }
        state.authorized = true;
        Ok(vec![state.account])
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.record(MockCall::Accounts);
        let state = self.state.lock();
        Ok(if state.authorized { vec![state.account] } else { vec![] })
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        self.record(MockCall::ChainId);
        Ok(self.state.lock().chain_id)
    }

    async fn sign_message(
        &self,
        signer: Address,
        message: &[u8],
    ) -> Result<Signature, ProviderError> {
        self.record(MockCall::SignMessage { signer, message: message.to_vec() });
        let (sign_error, on_sign) = {
            let mut state = self.state.lock();
            (state.sign_error.clone(), state.on_sign.take())
        };
        if let Some(event) = on_sign {
            self.emit(event);
        }
        if let Some(err) = sign_error {
            return Err(err);
        }
        if signer != self.signer.address() {
            return Err(ProviderError::unauthorized(format!("unknown account {signer}")));
        }
        self.signer
            .sign_message_sync(message)
            .map_err(|err| ProviderError::Transport(err.to_string()))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError> {
        self.record(MockCall::SendTransaction(Box::new(tx.clone())));
        let on_send = self.state.lock().on_send.take();
        if let Some(event) = on_send {
            self.emit(event);
        }
        let mut state = self.state.lock();
        if let Some(err) = state.send_error.clone() {
            return Err(err);
        }
        let from = tx.from.unwrap_or(state.account);
        let nonce = state.nonce;
        state.nonce += 1;
        let hash = keccak256([from.as_slice(), nonce.to_be_bytes().as_slice()].concat());
        let create = matches!(tx.to, None | Some(TxKind::Create));
        state.sent.insert(hash, SentTx { from, nonce, create });
        Ok(hash)
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, ProviderError> {
        self.record(MockCall::Call(Box::new(tx)));
        self.state.lock().call_result.clone()
    }

    fn watch_transaction(
        &self,
        hash: TxHash,
        confirmations: u64,
    ) -> Result<BoxStream<'static, TxUpdate>, ProviderError> {
        self.record(MockCall::WatchTransaction { hash, confirmations });
        let mut state = self.state.lock();
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = state.sent.get(&hash).copied();
        match (state.watch, sent) {
            (WatchMode::Auto { success }, Some(sent)) => {
                let _ = tx.send(TxUpdate::Seen { from: sent.from, nonce: sent.nonce });
                let _ = tx.send(TxUpdate::Final(receipt_for(hash, &sent, success)));
            }
            (WatchMode::Manual, _) => {
                state.watchers.insert(hash, tx);
            }
            (WatchMode::Drop, _) | (_, None) => {
                let _ = tx.send(TxUpdate::Dropped("transaction not found".into()));
            }
        }
        Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|update| (update, rx))
        })))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
