//! The outcome feed: a cache-level broadcast of RPC completions.
//!
//! One bus per application. The query layer publishes every settled call
//! into it; any number of consumers subscribe. Subscribing is what makes
//! the interceptor *central* — it observes failures from requests fired
//! anywhere, without per-call hooks.

use tokio::sync::broadcast;

use crate::QueryOutcome;

/// Default channel capacity. Outcomes are small and consumers are fast;
/// a lagging consumer skips ahead rather than blocking publishers.
const DEFAULT_CAPACITY: usize = 256;

/// The publishing half of the outcome feed.
///
/// Cheap to clone — hand one to every place the query cache settles
/// calls. Publishing never blocks and never fails; with no subscribers
/// the outcome is simply dropped.
#[derive(Clone)]
pub struct OutcomeBus {
    sender: broadcast::Sender<QueryOutcome>,
}

impl OutcomeBus {
    /// Creates a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus with an explicit buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes one completed call into the feed.
    pub fn publish(&self, outcome: QueryOutcome) {
        // A send error only means "no subscribers right now" — fine.
        let _ = self.sender.send(outcome);
    }

    /// Subscribes to all future completions.
    pub fn subscribe(&self) -> OutcomeStream {
        OutcomeStream {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for OutcomeBus {
    fn default() -> Self {
        Self::new()
    }
}

/// The consuming half of the outcome feed.
pub struct OutcomeStream {
    receiver: broadcast::Receiver<QueryOutcome>,
}

impl OutcomeStream {
    /// Receives the next completion.
    ///
    /// Returns `None` once the bus (every publisher clone) is gone.
    /// If this consumer lagged behind the buffer, skipped outcomes are
    /// logged and the stream continues from the oldest retained one —
    /// losing outcomes is acceptable, blocking the feed is not.
    pub async fn next(&mut self) -> Option<QueryOutcome> {
        loop {
            match self.receiver.recv().await {
                Ok(outcome) => return Some(outcome),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "outcome stream lagged, skipping ahead");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
