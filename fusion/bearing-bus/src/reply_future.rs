//! One-shot completion cells keyed by an outbound message id.
//!
//! Not a general concurrent promise: each `ReplyFuture` has exactly one
//! producer (the receive loop settling it) and is read by exactly one
//! waiter (the sender that registered it). Settlement is stored behind a
//! `parking_lot::Mutex` and polled, matching this codebase's preference for
//! simple mutex-guarded shared state over a hand-rolled `Future` impl.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use bearing_proto::Envelope;

#[derive(Clone)]
pub struct ReplyFuture {
    origin_id: i64,
    settled: Arc<Mutex<Option<Envelope>>>,
}

impl ReplyFuture {
    pub fn new(origin_id: i64) -> Self {
        Self {
            origin_id,
            settled: Arc::new(Mutex::new(None)),
        }
    }

    pub fn origin_id(&self) -> i64 {
        self.origin_id
    }

    /// Store the reply. Idempotent: a second settle is a no-op.
    pub fn settle(&self, reply: Envelope) {
        let mut guard = self.settled.lock();
        if guard.is_some() {
            tracing::debug!(id = self.origin_id, "reply future already settled, ignoring");
            return;
        }
        *guard = Some(reply);
    }

    pub fn is_settled(&self) -> bool {
        self.settled.lock().is_some()
    }

    pub fn take(&self) -> Option<Envelope> {
        self.settled.lock().take()
    }

    /// Poll every `poll_interval` until settled or `timeout` elapses. Returns
    /// whether it settled in time.
    pub async fn wait_until_done(&self, poll_interval: Duration, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.is_settled() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bearing_proto::Envelope;

    fn dummy_ack(id: i64) -> Envelope {
        Envelope::ack(id, true, 0.0, id + 1)
    }

    #[tokio::test]
    async fn settles_and_is_observed() {
        let fut = ReplyFuture::new(5);
        assert!(!fut.is_settled());
        fut.settle(dummy_ack(5));
        assert!(fut.is_settled());
        assert!(
            fut.wait_until_done(Duration::from_millis(1), Duration::from_millis(50))
                .await
        );
    }

    #[tokio::test]
    async fn second_settle_is_ignored() {
        let fut = ReplyFuture::new(1);
        fut.settle(dummy_ack(1));
        fut.settle(dummy_ack(999));
        let reply = fut.take().unwrap();
        assert_eq!(reply.id(), 2);
    }

    #[tokio::test]
    async fn times_out_when_never_settled() {
        let fut = ReplyFuture::new(1);
        let ok = fut
            .wait_until_done(Duration::from_millis(5), Duration::from_millis(20))
            .await;
        assert!(!ok);
    }
}
