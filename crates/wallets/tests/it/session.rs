//! Session lifecycle against a mock provider.

use std::{sync::Arc, time::Duration};

use alloy_primitives::{Address, U256, address};
use alloy_rpc_types_eth::TransactionRequest;
use vellum_common::ErrorKind;
use vellum_test_utils::{MockCall, MockProvider};
use vellum_wallets::{ProviderError, ProviderEvent, SessionError, SessionEvent, WalletSession};

const OTHER: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

fn session(mock: MockProvider) -> (Arc<MockProvider>, WalletSession) {
    vellum_test_utils::init_tracing();
    let mock = Arc::new(mock);
    let session = WalletSession::new(mock.clone());
    (mock, session)
}

#[tokio::test]
async fn connects() {
    let (mock, session) = session(MockProvider::new());
    let mut events = session.subscribe();

    let address = session.connect().await.unwrap();
    assert_eq!(address, mock.address());

    let snapshot = session.snapshot();
    assert!(snapshot.connected);
    assert!(snapshot.has_signer);
    assert_eq!(snapshot.chain_id, Some(11155111));
    assert_eq!(session.current_address(), Some(mock.address()));
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Connected { address, chain_id: Some(11155111) }
    );
}

#[tokio::test]
async fn no_provider() {
    let session = WalletSession::without_provider();
    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::ProviderUnavailable));
    assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    assert!(matches!(session.signer_guard().await, Err(SessionError::ProviderUnavailable)));
}

#[tokio::test]
async fn user_rejects_connection() {
    let mock = MockProvider::new();
    mock.reject_connect();
    let (_mock, session) = session(mock);

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::UserRejected), "{err:?}");
    assert_eq!(session.snapshot(), Default::default());
}

#[tokio::test]
async fn never_double_submits() {
    let mock = MockProvider::new();
    mock.set_connect_delay(Duration::from_millis(50));
    let (mock, session) = session(mock);

    let (first, second) = tokio::join!(session.connect(), session.connect());
    assert_eq!(first.unwrap(), mock.address());
    assert!(matches!(second, Err(SessionError::ConnectionPending)));
    assert_eq!(
        mock.calls().iter().filter(|call| **call == MockCall::RequestAccounts).count(),
        1
    );

    // the guard is released once the first request resolves
    assert_eq!(session.connect().await.unwrap(), mock.address());
}

#[tokio::test]
async fn provider_reports_pending_request() {
    let mock = MockProvider::new();
    mock.set_connect_error(ProviderError::Rpc {
        code: -32002,
        message: "Request of type 'wallet_requestPermissions' already pending".into(),
        data: None,
    });
    let (_mock, session) = session(mock);

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::ConnectionPending));
    assert!(err.kind().is_retryable_by_user());
}

#[tokio::test]
async fn reconnect_reaffirms_account() {
    let (mock, session) = session(MockProvider::new());
    session.connect().await.unwrap();
    mock.clear_calls();

    assert_eq!(session.connect().await.unwrap(), mock.address());
    assert_eq!(mock.calls(), vec![MockCall::Accounts]);
}

#[tokio::test]
async fn account_change_invalidates_signing() {
    let (mock, session) = session(MockProvider::new());
    session.connect().await.unwrap();
    mock.emit_on_sign(ProviderEvent::AccountsChanged(vec![OTHER]));

    let err = session.sign_message(b"hello").await.unwrap_err();
    match err {
        SessionError::SessionInvalidated { expected, actual } => {
            assert_eq!(expected, mock.address());
            assert_eq!(actual, Some(OTHER));
        }
        err => panic!("unexpected error: {err:?}"),
    }
    assert_eq!(session.current_address(), Some(OTHER));
}

#[tokio::test]
async fn signs_with_connected_account() {
    let (mock, session) = session(MockProvider::new());
    session.connect().await.unwrap();

    let (signer, signature) = session.sign_message(b"hello").await.unwrap();
    assert_eq!(signer, mock.address());
    assert_eq!(signature.recover_address_from_msg(b"hello").unwrap(), mock.address());
}

#[tokio::test]
async fn signing_rejected() {
    let mock = MockProvider::new();
    mock.reject_signing();
    let (_mock, session) = session(mock);
    session.connect().await.unwrap();

    let err = session.sign_message(b"hello").await.unwrap_err();
    assert!(matches!(err, SessionError::UserRejected));
}

#[tokio::test]
async fn empty_accounts_disconnect() {
    let (mock, session) = session(MockProvider::new());
    session.connect().await.unwrap();
    let mut events = session.subscribe();

    mock.emit(ProviderEvent::AccountsChanged(vec![]));
    let snapshot = session.snapshot();
    assert!(!snapshot.connected);
    assert!(!snapshot.has_signer);
    assert_eq!(snapshot.address, None);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Disconnected);
    assert!(matches!(session.guard(), Err(SessionError::NotConnected)));
}

#[tokio::test]
async fn follows_chain_changes() {
    let (mock, session) = session(MockProvider::new());
    session.connect().await.unwrap();
    let mut events = session.subscribe();

    mock.emit(ProviderEvent::ChainChanged(1));
    assert_eq!(session.snapshot().chain_id, Some(1));
    assert_eq!(events.try_recv().unwrap(), SessionEvent::ChainChanged(1));
    assert_eq!(session.fetch_chain_id().await.unwrap(), 1);
}

#[tokio::test]
async fn disconnect_is_local() {
    let (mock, session) = session(MockProvider::new());
    session.connect().await.unwrap();
    mock.clear_calls();

    session.disconnect();
    assert!(!session.snapshot().connected);
    assert!(mock.calls().is_empty());
    // the wallet still remembers the site
    assert_eq!(session.connect().await.unwrap(), mock.address());
}

#[tokio::test]
async fn read_only_provider_has_no_signer() {
    let (_mock, session) = session(MockProvider::new().read_only());
    session.connect().await.unwrap();
    assert!(!session.snapshot().has_signer);

    assert!(matches!(session.signer_guard().await, Err(SessionError::SignerUnavailable)));
    assert!(matches!(session.sign_message(b"x").await, Err(SessionError::SignerUnavailable)));
}

#[tokio::test]
async fn signer_guard_connects_once() {
    let (mock, session) = session(MockProvider::new());
    let guard = session.signer_guard().await.unwrap();
    assert_eq!(guard.address(), mock.address());
    assert_eq!(guard.chain_id(), Some(11155111));
}

#[tokio::test]
async fn transaction_sent_from_guarded_account() {
    let (mock, session) = session(MockProvider::new());
    let guard = session.signer_guard().await.unwrap();

    let tx = TransactionRequest::default().to(OTHER).value(U256::from(1));
    session.send_transaction(&guard, tx).await.unwrap();
    let Some(MockCall::SendTransaction(sent)) = mock.calls().pop() else {
        panic!("transaction was not sent")
    };
    assert_eq!(sent.from, Some(mock.address()));

    mock.emit(ProviderEvent::AccountsChanged(vec![OTHER]));
    let err = session.send_transaction(&guard, TransactionRequest::default()).await.unwrap_err();
    assert!(matches!(err, SessionError::SessionInvalidated { .. }));
    assert_eq!(err.kind(), ErrorKind::SessionInvalidated);
}
