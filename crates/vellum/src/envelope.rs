//! Signed authorization envelopes for mutating backend requests.

use alloy_primitives::{Address, Signature, hex};
use std::{fmt, sync::Arc};
use vellum_backend::types::SignedPayload;
use vellum_common::{CanonicalAddress, ErrorKind, address::parse_address};
use vellum_wallets::{SessionError, WalletSession};

/// First line of every envelope message.
pub const ENVELOPE_HEADER: &str = "Vellum authorization";

/// What the signer authorizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    SaveReference,
    DeleteReference,
}

impl Intent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SaveReference => "save-contract-reference",
            Self::DeleteReference => "delete-contract-reference",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional context shown to the signer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextFields {
    /// Display name of the reference.
    pub name: Option<String>,
    /// Contract name in its source file.
    pub contract: Option<String>,
    pub network: Option<String>,
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("signature request rejected in wallet")]
    SignatureRejected,
    #[error(transparent)]
    Session(SessionError),
    #[error("signature does not recover to {expected}: {reason}")]
    InvalidSignature { expected: Address, reason: String },
}

impl EnvelopeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SignatureRejected | Self::InvalidSignature { .. } => ErrorKind::SignatureRejected,
            Self::Session(err) => err.kind(),
        }
    }
}

impl From<SessionError> for EnvelopeError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UserRejected => Self::SignatureRejected,
            err => Self::Session(err),
        }
    }
}

/// Renders the message to sign.
///
/// The output depends only on the inputs: field order is fixed, absent fields are empty,
/// line breaks inside values become spaces.
pub fn canonical_message(intent: Intent, subject: &str, context: &ContextFields) -> String {
    let subject = match parse_address(subject) {
        Ok(address) => CanonicalAddress::from(address).to_string(),
        Err(_) => single_line(subject),
    };
    let field = |value: &Option<String>| value.as_deref().map(single_line).unwrap_or_default();
    [
        ENVELOPE_HEADER.to_string(),
        format!("Intent: {intent}"),
        format!("Subject: {subject}"),
        format!("Name: {}", field(&context.name)),
        format!("Contract: {}", field(&context.contract)),
        format!("Network: {}", field(&context.network).to_lowercase()),
    ]
    .join("\n")
}

fn single_line(value: &str) -> String {
    value.trim().replace(['\r', '\n'], " ")
}

/// A message with the signature of the connected account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationEnvelope {
    pub message: String,
    pub signature: Signature,
    pub signer_address: Address,
}

impl AuthorizationEnvelope {
    /// Checks that the signature recovers to the signer address.
    pub fn verify(&self) -> Result<(), EnvelopeError> {
        let invalid = |reason: String| EnvelopeError::InvalidSignature {
            expected: self.signer_address,
            reason,
        };
        let recovered = self
            .signature
            .recover_address_from_msg(self.message.as_bytes())
            .map_err(|err| invalid(err.to_string()))?;
        if recovered != self.signer_address {
            return Err(invalid(format!("recovered {recovered}")));
        }
        Ok(())
    }

    /// The wire form sent to the backend.
    pub fn into_payload(self) -> SignedPayload {
        SignedPayload {
            signed_message: self.message,
            signature: hex::encode_prefixed(self.signature.as_bytes()),
            user_address: self.signer_address.into(),
        }
    }
}

/// Signs canonical messages through the session. Does no network I/O of its own.
#[derive(Clone, Debug)]
pub struct AuthorizationEnvelopeBuilder {
    session: Arc<WalletSession>,
}

impl AuthorizationEnvelopeBuilder {
    pub fn new(session: Arc<WalletSession>) -> Self {
        Self { session }
    }

    pub async fn build(
        &self,
        intent: Intent,
        subject: &str,
        context: &ContextFields,
    ) -> Result<AuthorizationEnvelope, EnvelopeError> {
        let message = canonical_message(intent, subject, context);
        debug!(%intent, subject, "requesting authorization signature");
        let (signer_address, signature) = self.session.sign_message(message.as_bytes()).await?;
        Ok(AuthorizationEnvelope { message, signature, signer_address })
    }
}
