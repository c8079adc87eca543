use parking_lot::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    provider::ProviderEvent,
    wallet_browser::{
        queue::RequestQueue,
        types::{BrowserTransaction, Connection, SignRequest, SignResponse, TransactionResponse},
    },
};

#[derive(Debug)]
pub(crate) struct BrowserWalletState {
    /// Current information about the wallet connection.
    connection: Mutex<Option<Connection>>,
    /// Request/response queue for transactions.
    transactions: Mutex<RequestQueue<BrowserTransaction, TransactionResponse>>,
    /// Request/response queue for message signatures.
    signatures: Mutex<RequestQueue<SignRequest, SignResponse>>,
    /// Token the page must echo in `X-Session-Token`.
    session_token: String,
    events: broadcast::Sender<ProviderEvent>,
}

impl BrowserWalletState {
    pub fn new() -> Self {
        Self {
            connection: Mutex::new(None),
            transactions: Mutex::new(RequestQueue::new()),
            signatures: Mutex::new(RequestQueue::new()),
            session_token: Uuid::new_v4().simple().to_string(),
            events: broadcast::channel(64).0,
        }
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.lock().is_some()
    }

    pub fn get_connection(&self) -> Option<Connection> {
        *self.connection.lock()
    }

    /// Records the page's connection and notifies subscribers of what changed.
    pub fn set_connection(&self, connection: Option<Connection>) {
        let previous = std::mem::replace(&mut *self.connection.lock(), connection);
        let events = match (previous, connection) {
            (Some(_), None) => vec![ProviderEvent::AccountsChanged(vec![])],
            (None, Some(_)) => vec![],
            (Some(prev), Some(next)) => {
                let mut events = vec![];
                if prev.address != next.address {
                    events.push(ProviderEvent::AccountsChanged(vec![next.address]));
                }
                if prev.chain_id != next.chain_id {
                    events.push(ProviderEvent::ChainChanged(next.chain_id));
                }
                events
            }
            (None, None) => vec![],
        };
        for event in events {
            debug!(?event, "browser wallet notification");
            let _ = self.events.send(event);
        }
    }

    pub fn add_transaction_request(&self, request: BrowserTransaction) {
        self.transactions.lock().add_request(request);
    }

    pub fn has_transaction_request(&self, id: &Uuid) -> bool {
        self.transactions.lock().has_request(id)
    }

    pub fn read_next_transaction_request(&self) -> Option<BrowserTransaction> {
        self.transactions.lock().read_request().cloned()
    }

    pub fn remove_transaction_request(&self, id: &Uuid) {
        self.transactions.lock().remove_request(id);
    }

    pub fn add_transaction_response(&self, response: TransactionResponse) {
        let id = response.id;
        let mut transactions = self.transactions.lock();
        transactions.add_response(id, response);
        transactions.remove_request(&id);
    }

    pub fn get_transaction_response(&self, id: &Uuid) -> Option<TransactionResponse> {
        self.transactions.lock().get_response(id)
    }

    pub fn add_signing_request(&self, request: SignRequest) {
        self.signatures.lock().add_request(request);
    }

    pub fn has_signing_request(&self, id: &Uuid) -> bool {
        self.signatures.lock().has_request(id)
    }

    pub fn read_next_signing_request(&self) -> Option<SignRequest> {
        self.signatures.lock().read_request().cloned()
    }

    pub fn remove_signing_request(&self, id: &Uuid) {
        self.signatures.lock().remove_request(id);
    }

    pub fn add_signing_response(&self, response: SignResponse) {
        let id = response.id;
        let mut signatures = self.signatures.lock();
        signatures.add_response(id, response);
        signatures.remove_request(&id);
    }

    pub fn get_signing_response(&self, id: &Uuid) -> Option<SignResponse> {
        self.signatures.lock().get_response(id)
    }
}
