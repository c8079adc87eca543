use reqwest::StatusCode;
use vellum_common::ErrorKind;

/// Errors talking to the persistence backend.
#[derive(Clone, Debug, thiserror::Error)]
pub enum BackendError {
    #[error("could not reach the backend: {0}")]
    Unreachable(String),
    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("unexpected backend response: {0}")]
    Decode(String),
    #[error("refusing to save a contract reference without an ABI")]
    MissingAbi,
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Rejected { status, .. } if *status == StatusCode::NOT_FOUND => ErrorKind::NotFound,
            Self::MissingAbi => ErrorKind::ArgumentEncoding,
            _ => ErrorKind::BackendUnreachable,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

/// Errors producing a [`CompiledArtifact`](crate::CompiledArtifact).
#[derive(Clone, Debug, thiserror::Error)]
pub enum CompileError {
    /// Blocking diagnostics reported by the compiler.
    #[error("compilation failed:\n{}", .0.join("\n"))]
    Diagnostics(Vec<String>),
    #[error("no contracts found in {0}")]
    NoContracts(String),
    #[error("no bytecode generated for contract `{0}`, is it abstract or an interface?")]
    MissingBytecode(String),
    #[error("failed to run solc: {0}")]
    Solc(String),
    #[error("could not reach the compiler service: {0}")]
    Unreachable(String),
    #[error("unexpected compiler output: {0}")]
    Decode(String),
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreachable(_) => ErrorKind::BackendUnreachable,
            _ => ErrorKind::Compilation,
        }
    }
}
