use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BrowserWalletError {
    #[error("failed to start browser wallet server: {0}")]
    Server(#[from] std::io::Error),
    #[error("browser wallet server is not running")]
    NotRunning,
    #[error("browser wallet is not connected")]
    NotConnected,
    #[error("{operation} rejected: {reason}")]
    Rejected { operation: &'static str, code: Option<i64>, reason: String },
    #[error("{operation} request timed out after {timeout:?}")]
    Timeout { operation: &'static str, timeout: Duration },
    #[error("browser wallet returned an invalid signature: {0}")]
    InvalidSignature(String),
}
