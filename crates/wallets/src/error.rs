use alloy_primitives::{Address, Bytes, hex::FromHexError};
use alloy_signer_local::LocalSignerError;
use alloy_sol_types::{Revert, SolError};
use alloy_transport::TransportError;
use std::time::Duration;
use vellum_common::ErrorKind;

use crate::wallet_browser::error::BrowserWalletError;

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 code for an unauthorized account or method.
pub const UNAUTHORIZED_CODE: i64 = 4100;

/// Code returned by injected wallets while an identical request is still open.
pub const REQUEST_PENDING_CODE: i64 = -32002;

/// JSON-RPC code used by nodes for `execution reverted`.
pub const EXECUTION_REVERTED_CODE: i64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum PrivateKeyError {
    #[error("Failed to create wallet from private key. Private key is invalid hex: {0}")]
    InvalidHex(#[from] FromHexError),
    #[error(
        "Failed to create wallet from private key. Invalid private key. But env var {0} exists. Is the `$` anchor missing?"
    )]
    ExistsAsEnvVar(String),
    #[error(transparent)]
    Local(#[from] LocalSignerError),
}

/// Errors surfaced by a [`WalletProvider`](crate::WalletProvider).
#[derive(Clone, Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no wallet provider detected")]
    Unavailable,
    #[error("{message} (code {code})")]
    Rpc { code: i64, message: String, data: Option<String> },
    #[error("wallet did not answer within {0:?}")]
    Timeout(Duration),
    #[error("{0} is not supported by this provider")]
    Unsupported(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    /// A rejection reported with the standard EIP-1193 code.
    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::Rpc { code: USER_REJECTED_CODE, message: message.into(), data: None }
    }

    /// The account is not authorized for the requested operation.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Rpc { code: UNAUTHORIZED_CODE, message: message.into(), data: None }
    }

    fn rpc_message(&self) -> Option<String> {
        match self {
            Self::Rpc { message, .. } => Some(message.to_lowercase()),
            Self::Transport(message) => Some(message.to_lowercase()),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the user declined the request in their wallet.
    pub fn is_user_rejected(&self) -> bool {
        if self.code() == Some(USER_REJECTED_CODE) {
            return true;
        }
        self.rpc_message().is_some_and(|msg| {
            msg.contains("user rejected") ||
                msg.contains("user denied") ||
                msg.contains("action_rejected")
        })
    }

    /// Whether the wallet already has an identical request open.
    pub fn is_request_pending(&self) -> bool {
        self.code() == Some(REQUEST_PENDING_CODE)
    }

    pub fn is_insufficient_funds(&self) -> bool {
        self.rpc_message().is_some_and(|msg| msg.contains("insufficient funds"))
    }

    pub fn is_revert(&self) -> bool {
        self.code() == Some(EXECUTION_REVERTED_CODE) ||
            self.rpc_message().is_some_and(|msg| msg.contains("revert"))
    }

    /// The revert reason, decoded from the error data when the node returned it.
    pub fn revert_reason(&self) -> Option<String> {
        let Self::Rpc { message, data, .. } = self else { return None };
        if let Some(reason) = data
            .as_deref()
            .and_then(|data| data.parse::<Bytes>().ok())
            .and_then(|data| {
                Revert::abi_decode(&data)
                    .map(|revert| revert.reason)
                    .ok()
                    .or_else(|| alloy_sol_types::decode_revert_reason(&data))
            })
        {
            return Some(reason);
        }
        message
            .strip_prefix("execution reverted: ")
            .or_else(|| message.strip_prefix("execution reverted:"))
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty())
    }

    /// Maps this error onto the user-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        if matches!(self, Self::Unavailable) {
            ErrorKind::ProviderUnavailable
        } else if self.is_user_rejected() {
            ErrorKind::UserRejected
        } else if self.is_request_pending() {
            ErrorKind::ConnectionPending
        } else if self.is_insufficient_funds() {
            ErrorKind::InsufficientFunds
        } else if self.is_revert() {
            ErrorKind::CallReverted
        } else {
            ErrorKind::Provider
        }
    }
}

impl From<TransportError> for ProviderError {
    fn from(err: TransportError) -> Self {
        if let Some(payload) = err.as_error_resp() {
            return Self::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
                data: payload.data.as_ref().map(|data| data.get().trim_matches('"').to_string()),
            };
        }
        Self::Transport(err.to_string())
    }
}

impl From<BrowserWalletError> for ProviderError {
    fn from(err: BrowserWalletError) -> Self {
        match err {
            BrowserWalletError::Rejected { code, reason, .. } => Self::Rpc {
                // wallets that omit the code still get classified by message
                code: code.unwrap_or(-32603),
                message: reason,
                data: None,
            },
            BrowserWalletError::NotConnected => Self::unauthorized("browser wallet is not connected"),
            BrowserWalletError::Timeout { timeout, .. } => Self::Timeout(timeout),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Errors returned by [`WalletSession`](crate::WalletSession) operations.
#[derive(Clone, Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no wallet provider detected")]
    ProviderUnavailable,
    #[error("request rejected in wallet")]
    UserRejected,
    #[error("a connection request is already pending, check your wallet")]
    ConnectionPending,
    #[error("no signer available, connect a wallet first")]
    SignerUnavailable,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("wallet account changed from {expected} to {}", .actual.map(|a| a.to_string()).unwrap_or_else(|| "none".into()))]
    SessionInvalidated { expected: Address, actual: Option<Address> },
    #[error(transparent)]
    Provider(ProviderError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProviderUnavailable => ErrorKind::ProviderUnavailable,
            Self::UserRejected => ErrorKind::UserRejected,
            Self::ConnectionPending => ErrorKind::ConnectionPending,
            Self::SignerUnavailable | Self::NotConnected => ErrorKind::SignerUnavailable,
            Self::SessionInvalidated { .. } => ErrorKind::SessionInvalidated,
            Self::Provider(err) => err.kind(),
        }
    }
}

impl From<ProviderError> for SessionError {
    fn from(err: ProviderError) -> Self {
        if matches!(err, ProviderError::Unavailable) {
            Self::ProviderUnavailable
        } else if err.is_user_rejected() {
            Self::UserRejected
        } else if err.is_request_pending() {
            Self::ConnectionPending
        } else {
            Self::Provider(err)
        }
    }
}
