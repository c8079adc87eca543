//! Typed invocation surface derived from a contract ABI at runtime.

use vellum_common::ErrorKind;

mod param;
pub use param::{ParamKind, render};

mod registry;
pub use registry::{
    AbiParam, AbiRegistry, FunctionKind, InvocableFunction, RejectedFunction, encode_deploy_code,
};

mod invoke;
pub use invoke::{ContractInvoker, InvokeError};

/// Errors deriving or encoding calls from an ABI.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("unsupported parameter type `{0}`")]
    UnsupportedType(String),
    #[error("invalid {ty} value `{value}`: {reason}")]
    InvalidValue { ty: String, value: String, reason: String },
    #[error("argument `{name}`: {source}")]
    InvalidArgument {
        name: String,
        #[source]
        source: Box<AbiError>,
    },
    #[error("expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },
    #[error("argument #{index} (`{name}`) is not set")]
    MissingArgument { index: usize, name: String },
    #[error("no function `{0}` in ABI")]
    UnknownFunction(String),
    #[error("`{name}` is overloaded, use one of: {}", .candidates.join(", "))]
    AmbiguousFunction { name: String, candidates: Vec<String> },
    #[error("failed to encode arguments: {0}")]
    Encode(String),
    /// The return data does not match the function's outputs, e.g. the target has no code.
    #[error("failed to decode return data: {0}")]
    Decode(String),
}

impl AbiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFunction(_) => ErrorKind::NotFound,
            Self::Decode(_) => ErrorKind::Provider,
            _ => ErrorKind::ArgumentEncoding,
        }
    }
}
