//! The pending-reply table shared by both endpoint kinds: an id-indexed map
//! of [`ReplyFuture`]s, guarded by a mutex held only across single-entry
//! operations (never across network I/O).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use bearing_proto::Envelope;

use crate::reply_future::ReplyFuture;

#[derive(Clone, Default)]
pub struct PendingReplies {
    inner: Arc<Mutex<HashMap<i64, ReplyFuture>>>,
}

impl PendingReplies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: i64) -> ReplyFuture {
        let fut = ReplyFuture::new(id);
        self.inner.lock().insert(id, fut.clone());
        fut
    }

    /// Try to settle the pending future for `to`, removing it from the
    /// table. Returns whether a matching future was found.
    pub fn settle(&self, to: i64, reply: Envelope) -> bool {
        let fut = self.inner.lock().remove(&to);
        match fut {
            Some(fut) => {
                fut.settle(reply);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
