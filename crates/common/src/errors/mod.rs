//! Commonly used errors

use std::fmt;

mod private {
    use eyre::Chain;
    use std::error::Error;

    pub trait ErrorChain {
        fn chain(&self) -> Chain<'_>;
    }

    impl ErrorChain for dyn Error + 'static {
        fn chain(&self) -> Chain<'_> {
            Chain::new(self)
        }
    }

    impl ErrorChain for eyre::Report {
        fn chain(&self) -> Chain<'_> {
            self.chain()
        }
    }
}

/// Displays a chain of errors in a single line.
pub fn display_chain<E: private::ErrorChain + ?Sized>(error: &E) -> String {
    dedup_chain(error).join("; ")
}

/// Deduplicates a chain of errors.
pub fn dedup_chain<E: private::ErrorChain + ?Sized>(error: &E) -> Vec<String> {
    let mut causes = all_sources(error);
    // Deduplicate the common pattern `msg1: msg2; msg2` -> `msg1: msg2`.
    causes.dedup_by(|b, a| a.contains(b.as_str()));
    causes
}

fn all_sources<E: private::ErrorChain + ?Sized>(err: &E) -> Vec<String> {
    err.chain().map(|cause| cause.to_string().trim().to_string()).collect()
}

/// The user-facing failure categories every component error maps onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No wallet provider was detected.
    ProviderUnavailable,
    /// The user declined a wallet prompt.
    UserRejected,
    /// A connection request is already outstanding.
    ConnectionPending,
    /// The operation needs a signer and none is available.
    SignerUnavailable,
    /// The account changed while the operation was in flight.
    SessionInvalidated,
    /// The wallet is on a different chain than the request targets.
    WrongNetwork,
    /// The account cannot pay for the transaction.
    InsufficientFunds,
    /// A read call or transaction reverted.
    CallReverted,
    /// An argument does not fit its declared ABI type.
    ArgumentEncoding,
    /// The user declined to sign an authorization message.
    SignatureRejected,
    /// The compiler reported blocking diagnostics.
    Compilation,
    /// The persistence backend could not be reached or rejected the request.
    BackendUnreachable,
    /// The requested record does not exist.
    NotFound,
    /// Opaque provider or RPC failure.
    Provider,
}

impl ErrorKind {
    /// Whether the user may reasonably repeat the same action unchanged.
    ///
    /// Deployments are never in this set: repeating one creates a second contract.
    pub const fn is_retryable_by_user(self) -> bool {
        matches!(self, Self::BackendUnreachable | Self::ConnectionPending)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ProviderUnavailable => "provider unavailable",
            Self::UserRejected => "rejected by user",
            Self::ConnectionPending => "connection pending",
            Self::SignerUnavailable => "signer unavailable",
            Self::SessionInvalidated => "session invalidated",
            Self::WrongNetwork => "wrong network",
            Self::InsufficientFunds => "insufficient funds",
            Self::CallReverted => "call reverted",
            Self::ArgumentEncoding => "argument encoding error",
            Self::SignatureRejected => "signature rejected",
            Self::Compilation => "compilation error",
            Self::BackendUnreachable => "backend unreachable",
            Self::NotFound => "not found",
            Self::Provider => "provider error",
        };
        f.write_str(s)
    }
}
