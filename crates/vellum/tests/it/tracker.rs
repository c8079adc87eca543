//! Transaction tracking against the mock provider.

use alloy_primitives::{Address, TxHash};
use alloy_rpc_types_eth::TransactionRequest;
use std::sync::Arc;
use vellum::{TrackError, TransactionTracker, TxStatus};
use vellum_test_utils::{MockCall, MockProvider};
use vellum_wallets::{TxUpdate, WalletProvider};

async fn send(mock: &MockProvider) -> TxHash {
    let tx = TransactionRequest::default().from(mock.address()).to(Address::repeat_byte(0x11));
    mock.send_transaction(tx).await.unwrap()
}

fn watches(mock: &MockProvider) -> usize {
    mock.calls().iter().filter(|call| matches!(call, MockCall::WatchTransaction { .. })).count()
}

#[tokio::test]
async fn tracks_to_confirmation() {
    let mock = Arc::new(MockProvider::new());
    let tracker = TransactionTracker::new(mock.clone());
    let hash = send(&mock).await;

    let record = tracker.track(hash).wait().await.unwrap();
    assert_eq!(record.status, TxStatus::Confirmed);
    assert_eq!(record.history(), [TxStatus::Submitted, TxStatus::Pending, TxStatus::Confirmed]);
    assert_eq!(record.receipt.unwrap().transaction_hash, hash);
    assert!(mock.calls().contains(&MockCall::WatchTransaction { hash, confirmations: 1 }));
}

#[tokio::test]
async fn stays_pending_until_final() {
    let mock = Arc::new(MockProvider::new());
    mock.manual_watches();
    let tracker = TransactionTracker::new(mock.clone());
    let hash = send(&mock).await;
    let tx = tracker.track(hash);
    assert_eq!(tx.status(), TxStatus::Submitted);

    assert!(mock.push_update(hash, mock.seen(hash).unwrap()));
    let record = tx.wait_for(|record| record.status == TxStatus::Pending).await.unwrap();
    assert_eq!(record.sender, Some((mock.address(), 0)));
    assert!(record.receipt.is_none());

    assert!(mock.push_update(hash, TxUpdate::Final(mock.receipt(hash, false).unwrap())));
    let record = tx.wait().await.unwrap();
    assert_eq!(record.status, TxStatus::Reverted);
    assert_eq!(record.history(), [TxStatus::Submitted, TxStatus::Pending, TxStatus::Reverted]);
}

#[tokio::test]
async fn dropped_before_seen_fails() {
    let mock = Arc::new(MockProvider::new());
    mock.drop_transactions();
    let tracker = TransactionTracker::new(mock.clone());
    let hash = send(&mock).await;

    let record = tracker.track(hash).wait().await.unwrap();
    assert_eq!(record.status, TxStatus::Failed);
    assert_eq!(record.error.as_deref(), Some("transaction not found"));
    assert_eq!(record.history(), [TxStatus::Submitted, TxStatus::Failed]);
}

#[tokio::test]
async fn lost_watch_keeps_pending() {
    let mock = Arc::new(MockProvider::new());
    mock.manual_watches();
    let tracker = TransactionTracker::new(mock.clone());
    let hash = send(&mock).await;
    let tx = tracker.track(hash);

    mock.push_update(hash, mock.seen(hash).unwrap());
    tx.wait_for(|record| record.status == TxStatus::Pending).await.unwrap();
    mock.close_watch(hash);

    let err = tx.wait().await.unwrap_err();
    assert_eq!(err, TrackError::Lost { hash, status: TxStatus::Pending });
    let record = tx.record();
    assert_eq!(record.status, TxStatus::Pending);
    assert_eq!(record.error.as_deref(), Some("confirmation watch ended"));
}

#[tokio::test]
async fn tracks_each_hash_once() {
    let mock = Arc::new(MockProvider::new());
    mock.manual_watches();
    let tracker = TransactionTracker::new(mock.clone());
    let first = send(&mock).await;
    let second = send(&mock).await;

    let a = tracker.track(first);
    let again = tracker.track(first);
    let b = tracker.track(second);
    assert_eq!(a.hash(), again.hash());
    assert_eq!(watches(&mock), 2);

    mock.push_update(first, TxUpdate::Final(mock.receipt(first, true).unwrap()));
    assert_eq!(a.wait().await.unwrap().status, TxStatus::Confirmed);
    assert_eq!(again.status(), TxStatus::Confirmed);
    assert_eq!(b.status(), TxStatus::Submitted);
}

#[tokio::test]
async fn forgets_final_transactions() {
    let mock = Arc::new(MockProvider::new());
    mock.manual_watches();
    let tracker = TransactionTracker::new(mock.clone());
    let confirmed = send(&mock).await;
    let lost = send(&mock).await;
    let pending = send(&mock).await;

    let tx = tracker.track(confirmed);
    let lost_tx = tracker.track(lost);
    tracker.track(pending);
    assert_eq!(tracker.len(), 3);

    mock.push_update(confirmed, TxUpdate::Final(mock.receipt(confirmed, true).unwrap()));
    assert_eq!(tx.wait().await.unwrap().status, TxStatus::Confirmed);
    assert!(tracker.get(&confirmed).is_none());

    mock.close_watch(lost);
    lost_tx.wait().await.unwrap_err();
    assert!(tracker.get(&lost).is_none());

    assert_eq!(tracker.len(), 1);
    assert!(tracker.get(&pending).is_some());
}

#[tokio::test]
async fn cancel_discards_local_tracking() {
    let mock = Arc::new(MockProvider::new());
    mock.manual_watches();
    let tracker = TransactionTracker::new(mock.clone());
    let hash = send(&mock).await;
    tracker.track(hash);

    let record = tracker.cancel(&hash).unwrap();
    assert_eq!(record.status, TxStatus::Submitted);
    assert!(tracker.get(&hash).is_none());
    assert_eq!(tracker.cancel(&hash).unwrap_err(), TrackError::NotTracked(hash));
    // the send and the single watch, nothing for the cancel
    assert_eq!(mock.calls().len(), 2);
}

#[tokio::test]
async fn waits_for_configured_confirmations() {
    let mock = Arc::new(MockProvider::new());
    let tracker = TransactionTracker::with_confirmations(mock.clone(), 3);
    let hash = send(&mock).await;
    tracker.track(hash).wait().await.unwrap();
    assert!(mock.calls().contains(&MockCall::WatchTransaction { hash, confirmations: 3 }));

    let tracker = TransactionTracker::with_confirmations(mock.clone(), 0);
    assert_eq!(tracker.confirmations(), 1);
}
