use std::sync::Arc;
use vellum::TransactionTracker;
use vellum_test_utils::MockProvider;
use vellum_wallets::WalletSession;

/// Empty argument list.
pub const NO_ARGS: [&str; 0] = [];

/// A session over `mock`, tracked with the default confirmation count.
pub fn session(mock: &Arc<MockProvider>) -> (Arc<WalletSession>, Arc<TransactionTracker>) {
    vellum_test_utils::init_tracing();
    let session = Arc::new(WalletSession::new(mock.clone()));
    let tracker = Arc::new(TransactionTracker::new(mock.clone()));
    (session, tracker)
}

/// Same as [`session`], but connected.
pub async fn connected(
    mock: &Arc<MockProvider>,
) -> (Arc<WalletSession>, Arc<TransactionTracker>) {
    let (session, tracker) = session(mock);
    session.connect().await.unwrap();
    (session, tracker)
}
