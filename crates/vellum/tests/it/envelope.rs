//! Authorization envelopes signed by the mock wallet.

use alloy_primitives::{Signature, hex};
use std::sync::Arc;
use vellum::{AuthorizationEnvelopeBuilder, ContextFields, EnvelopeError, Intent};
use vellum_common::ErrorKind;
use vellum_test_utils::{MockCall, MockProvider};
use vellum_wallets::SessionError;

use crate::utils::{connected, session};

const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

fn context() -> ContextFields {
    ContextFields {
        name: Some("My counter".into()),
        contract: Some("Counter".into()),
        network: Some("sepolia".into()),
    }
}

#[tokio::test]
async fn signs_and_verifies() {
    let mock = Arc::new(MockProvider::new());
    let (session, _) = connected(&mock).await;
    let builder = AuthorizationEnvelopeBuilder::new(session);

    let envelope = builder.build(Intent::SaveReference, CONTRACT, &context()).await.unwrap();
    assert_eq!(envelope.signer_address, mock.address());
    envelope.verify().unwrap();
    assert!(envelope.message.contains("Subject: 0x5fbdb2315678afecb367f032d93f642f64180aa3"));

    let signed = mock.calls().into_iter().find_map(|call| match call {
        MockCall::SignMessage { message, .. } => Some(message),
        _ => None,
    });
    assert_eq!(signed.as_deref(), Some(envelope.message.as_bytes()));
}

#[tokio::test]
async fn deterministic_for_identical_inputs() {
    let mock = Arc::new(MockProvider::new());
    let (session, _) = connected(&mock).await;
    let builder = AuthorizationEnvelopeBuilder::new(session);

    let a = builder.build(Intent::DeleteReference, "doc-1", &context()).await.unwrap();
    let b = builder.build(Intent::DeleteReference, "doc-1", &context()).await.unwrap();
    assert_eq!(a, b);

    let other = builder.build(Intent::SaveReference, "doc-1", &context()).await.unwrap();
    assert_ne!(a.message, other.message);
}

#[tokio::test]
async fn rejection_is_signature_rejected() {
    let mock = Arc::new(MockProvider::new());
    let (session, _) = connected(&mock).await;
    mock.reject_signing();
    let builder = AuthorizationEnvelopeBuilder::new(session);

    let err = builder.build(Intent::SaveReference, CONTRACT, &context()).await.unwrap_err();
    assert!(matches!(err, EnvelopeError::SignatureRejected), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::SignatureRejected);
}

#[tokio::test]
async fn needs_a_connected_signer() {
    let mock = Arc::new(MockProvider::new());
    let (session, _) = session(&mock);
    let builder = AuthorizationEnvelopeBuilder::new(session);

    let err = builder.build(Intent::SaveReference, CONTRACT, &context()).await.unwrap_err();
    assert!(matches!(err, EnvelopeError::Session(SessionError::SignerUnavailable)), "{err:?}");
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn payload_wire_form() {
    let mock = Arc::new(MockProvider::new());
    let (session, _) = connected(&mock).await;
    let builder = AuthorizationEnvelopeBuilder::new(session);

    let mut envelope = builder.build(Intent::SaveReference, CONTRACT, &context()).await.unwrap();
    let payload = envelope.clone().into_payload();
    assert_eq!(payload.signed_message, envelope.message);
    assert_eq!(payload.user_address.to_string(), mock.address().to_string().to_lowercase());
    assert_eq!(payload.signature.len(), 2 + 130);
    let bytes = hex::decode(&payload.signature).unwrap();
    assert_eq!(Signature::try_from(bytes.as_slice()).unwrap(), envelope.signature);

    envelope.message.push_str(" tampered");
    assert!(matches!(envelope.verify(), Err(EnvelopeError::InvalidSignature { .. })));
}
