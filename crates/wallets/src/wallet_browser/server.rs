use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use alloy_primitives::{Address, Bytes, Signature, TxHash};
use alloy_provider::DynProvider;
use alloy_rpc_types_eth::TransactionRequest;
use parking_lot::Mutex;
use tokio::{net::TcpListener, sync::oneshot};
use uuid::Uuid;

use crate::wallet_browser::{
    error::BrowserWalletError,
    router::build_router,
    state::BrowserWalletState,
    types::{BrowserTransaction, Connection, SignRequest},
};

/// How often pending requests check for an answer from the page.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Local HTTP bridge between this process and a wallet injected into a browser page.
///
/// The page served at `/` connects `window.ethereum`, reports the connected account and
/// chain, and services the transaction and signing requests queued here.
#[derive(Clone, Debug)]
pub struct BrowserWalletServer {
    port: u16,
    timeout: Duration,
    state: Arc<BrowserWalletState>,
    reads: Option<DynProvider>,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl BrowserWalletServer {
    /// Creates a server for `port`; `0` picks a free port on [`start`](Self::start).
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self {
            port,
            timeout,
            state: Arc::new(BrowserWalletState::new()),
            reads: None,
            shutdown: Arc::new(Mutex::new(None)),
        }
    }

    /// Routes read calls and confirmation waits through `provider`.
    pub fn with_reads(mut self, provider: DynProvider) -> Self {
        self.reads = Some(provider);
        self
    }

    pub(crate) fn reads(&self) -> Option<&DynProvider> {
        self.reads.as_ref()
    }

    pub(crate) fn state(&self) -> &BrowserWalletState {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn session_token(&self) -> &str {
        self.state.session_token()
    }

    /// The page the user has to open.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn get_connection(&self) -> Option<Connection> {
        self.state.get_connection()
    }

    /// Binds the listener and serves the page and API in the background.
    pub async fn start(&mut self) -> Result<(), BrowserWalletError> {
        let listener =
            TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))).await?;
        self.port = listener.local_addr()?.port();

        let (tx, rx) = oneshot::channel();
        *self.shutdown.lock() = Some(tx);

        let router = build_router(self.state.clone());
        tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(err) = server.await {
                error!(%err, "browser wallet server failed");
            }
        });

        info!(url = %self.url(), "browser wallet server started");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), BrowserWalletError> {
        let tx = self.shutdown.lock().take().ok_or(BrowserWalletError::NotRunning)?;
        let _ = tx.send(());
        debug!(port = self.port, "browser wallet server stopped");
        Ok(())
    }

    /// Waits until the page reports a connected account.
    pub async fn wait_for_connection(&self) -> Result<Connection, BrowserWalletError> {
        let poll = async {
            loop {
                if let Some(connection) = self.state.get_connection() {
                    return connection;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(self.timeout, poll)
            .await
            .map_err(|_| BrowserWalletError::Timeout { operation: "Connection", timeout: self.timeout })
    }

    /// Queues `request` for the page and waits for the wallet to send it.
    pub async fn request_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<TxHash, BrowserWalletError> {
        if !self.is_connected() {
            return Err(BrowserWalletError::NotConnected);
        }
        let id = Uuid::new_v4();
        self.state.add_transaction_request(BrowserTransaction { id, request });
        debug!(%id, "queued browser transaction");

        let poll = async {
            loop {
                if let Some(response) = self.state.get_transaction_response(&id) {
                    return response;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        let response = match tokio::time::timeout(self.timeout, poll).await {
            Ok(response) => response,
            Err(_) => {
                self.state.remove_transaction_request(&id);
                return Err(BrowserWalletError::Timeout {
                    operation: "Transaction",
                    timeout: self.timeout,
                });
            }
        };

        match (response.hash, response.error) {
            (Some(hash), _) => Ok(hash),
            (None, reason) => Err(BrowserWalletError::Rejected {
                operation: "Transaction",
                code: response.code,
                reason: reason.unwrap_or_else(|| "no transaction hash returned".into()),
            }),
        }
    }

    /// Queues a `personal_sign` request for the page and waits for the signature.
    pub async fn request_signing(
        &self,
        address: Address,
        message: Bytes,
    ) -> Result<Signature, BrowserWalletError> {
        if !self.is_connected() {
            return Err(BrowserWalletError::NotConnected);
        }
        let id = Uuid::new_v4();
        self.state.add_signing_request(SignRequest { id, address, message });
        debug!(%id, %address, "queued browser signing request");

        let poll = async {
            loop {
                if let Some(response) = self.state.get_signing_response(&id) {
                    return response;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        let response = match tokio::time::timeout(self.timeout, poll).await {
            Ok(response) => response,
            Err(_) => {
                self.state.remove_signing_request(&id);
                return Err(BrowserWalletError::Timeout {
                    operation: "Signing",
                    timeout: self.timeout,
                });
            }
        };

        match (response.signature, response.error) {
            (Some(signature), _) => Signature::try_from(signature.as_ref())
                .map_err(|err| BrowserWalletError::InvalidSignature(err.to_string())),
            (None, reason) => Err(BrowserWalletError::Rejected {
                operation: "Signing",
                code: response.code,
                reason: reason.unwrap_or_else(|| "no signature returned".into()),
            }),
        }
    }
}
