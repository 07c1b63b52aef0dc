//! Token discovery feed plumbing.
//!
//! Discovery transports (block subscriptions, manual injection from the
//! CLI) push [`TokenHandle`]s into a bounded channel; the orchestrator
//! consumes the receiving end. Backpressure is deliberate: when all
//! position slots are busy, stale launches queue up and are dropped by
//! the sender rather than traded late.

use pump_trader_domain::prelude::TokenHandle;
use tokio::sync::mpsc;
use tracing::warn;

/// Sending half of the discovery feed.
#[derive(Clone)]
pub struct TokenSender {
    tx: mpsc::Sender<TokenHandle>,
}

/// Receiving half, owned by the orchestrator.
pub type TokenReceiver = mpsc::Receiver<TokenHandle>;

impl TokenSender {
    /// Offers a token to the pipeline without waiting. Returns `false`
    /// when the feed is full or closed; the token is dropped.
    pub fn offer(&self, token: TokenHandle) -> bool {
        match self.tx.try_send(token) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(token)) => {
                warn!(mint = %token.mint, "Discovery feed full, dropping token");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Queues a token, waiting for capacity. Returns `false` once the
    /// orchestrator has shut down.
    pub async fn publish(&self, token: TokenHandle) -> bool {
        self.tx.send(token).await.is_ok()
    }
}

/// Creates a discovery feed holding at most `capacity` pending tokens.
#[must_use]
pub fn token_feed(capacity: usize) -> (TokenSender, TokenReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (TokenSender { tx }, rx)
}
