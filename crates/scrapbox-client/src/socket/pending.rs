//! Acknowledgement correlation.
//!
//! Each outbound request gets its own wait slot keyed by ack id. The slot is
//! registered before the frame is written so a fast reply cannot be lost, and
//! removed by [`PendingAck`]'s drop whether the caller got its reply, timed
//! out, or was cancelled.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;

use super::SocketError;

/// Wait table shared between callers and the read loop.
#[derive(Debug, Default)]
pub(crate) struct PendingAcks {
    waiters: DashMap<u64, oneshot::Sender<String>>,
}

impl PendingAcks {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a wait slot for `ack_id`.
    pub(crate) fn register(self: &Arc<Self>, ack_id: u64) -> PendingAck {
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(ack_id, tx);
        PendingAck {
            ack_id,
            rx,
            table: Arc::clone(self),
        }
    }

    /// Deliver a reply body. Returns false when nobody is waiting on `ack_id`
    /// (already answered, timed out, or never sent).
    pub(crate) fn resolve(&self, ack_id: u64, body: String) -> bool {
        match self.waiters.remove(&ack_id) {
            Some((_, tx)) => tx.send(body).is_ok(),
            None => false,
        }
    }

    /// Release every waiter; their receivers observe a closed channel.
    pub(crate) fn fail_all(&self) {
        self.waiters.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }
}

/// One caller's claim on a reply.
#[derive(Debug)]
pub(crate) struct PendingAck {
    ack_id: u64,
    rx: oneshot::Receiver<String>,
    table: Arc<PendingAcks>,
}

impl PendingAck {
    /// Wait for the reply body. Errors when the connection dropped first.
    pub(crate) async fn wait(&mut self) -> Result<String, oneshot::error::RecvError> {
        (&mut self.rx).await
    }
}

impl Drop for PendingAck {
    fn drop(&mut self) {
        self.table.waiters.remove(&self.ack_id);
    }
}

/// Interpret an acknowledgement body.
///
/// The body is a JSON array; an `error` key on its first element means the
/// commit was rejected. A body that is not a JSON array still counts as
/// accepted: the service received the request and answered it.
pub(crate) fn check_ack(body: &str) -> Result<Value, SocketError> {
    let mut items: Vec<Value> = match serde_json::from_str(body) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable acknowledgement body, treating as accepted");
            return Ok(Value::Null);
        }
    };
    if items.is_empty() {
        return Ok(Value::Null);
    }
    let first = items.swap_remove(0);
    if let Some(err) = first.get("error") {
        let message = match err {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(SocketError::Commit(message));
    }
    Ok(first)
}
