// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pending-response table.
//!
//! Maps each in-flight correlation ID to the oneshot sender of the
//! waiter that owns it. The I/O task completes entries as responses
//! arrive; a waiter that stops waiting removes its own entry through
//! [`PendingGuard`], so abandoned responses are dropped rather than
//! stored forever.
//!
//! The lock is held only for a single insert or remove, never across
//! an I/O operation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use pulse_wire::CorrelationId;

use crate::stats::TransportStats;

struct State {
    entries: HashMap<CorrelationId, oneshot::Sender<Value>>,
    closed: bool,
}

/// Table of in-flight requests.
pub(crate) struct PendingTable {
    state: Mutex<State>,
    stats: Arc<TransportStats>,
}

impl PendingTable {
    pub(crate) fn new(stats: Arc<TransportStats>) -> Self {
        Self {
            state: Mutex::new(State {
                entries: HashMap::new(),
                closed: false,
            }),
            stats,
        }
    }

    /// Register a waiter for `id`.
    ///
    /// The returned guard removes the entry when dropped; the receiver
    /// resolves once the I/O task routes the matching response. On a
    /// closed table the sender is dropped under the same lock, so the
    /// receiver resolves immediately with a closed channel instead of
    /// leaving an entry nothing will ever wake.
    pub(crate) fn register(
        self: &Arc<Self>,
        id: CorrelationId,
    ) -> (oneshot::Receiver<Value>, PendingGuard) {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.lock();
            if !state.closed {
                state.entries.insert(id, tx);
            }
        }
        let guard = PendingGuard {
            table: Arc::clone(self),
            id,
        };
        (rx, guard)
    }

    /// Deliver a response to the waiter registered under `id`.
    ///
    /// Returns `false` when no waiter claims the ID (it gave up, or
    /// the server sent an ID it was never asked about).
    pub(crate) fn complete(&self, id: CorrelationId, value: Value) -> bool {
        let sender = self.state.lock().entries.remove(&id);
        match sender {
            // send fails only if the receiver dropped between the
            // table lookup and here; either way the entry is gone.
            Some(tx) => {
                if tx.send(value).is_ok() {
                    self.stats.record_delivered();
                    true
                } else {
                    self.stats.record_unclaimed();
                    false
                }
            },
            None => {
                self.stats.record_unclaimed();
                false
            },
        }
    }

    /// Close the table: drop every entry, waking all waiters with a
    /// closed channel, and refuse further registrations. Terminal.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.entries.clear();
    }

    /// Number of in-flight requests.
    pub(crate) fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    fn abandon(&self, id: CorrelationId) {
        if self.state.lock().entries.remove(&id).is_some() {
            self.stats.record_abandoned();
            tracing::debug!(%id, "waiter dropped before its response arrived");
        }
    }
}

/// Removes a waiter's table entry on drop.
///
/// Completion removes the entry first, making the drop a no-op; only a
/// waiter that never saw its response actually reaps anything.
pub(crate) struct PendingGuard {
    table: Arc<PendingTable>,
    id: CorrelationId,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.table.abandon(self.id);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn table() -> Arc<PendingTable> {
        Arc::new(PendingTable::new(Arc::new(TransportStats::new())))
    }

    #[tokio::test]
    async fn test_complete_delivers_to_registered_waiter() {
        let table = table();
        let id = CorrelationId::generate();
        let (rx, _guard) = table.register(id);

        assert!(table.complete(id, json!({"usage": 42})));
        assert_eq!(rx.await.unwrap(), json!({"usage": 42}));
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_is_unclaimed() {
        let table = table();
        assert!(!table.complete(CorrelationId::generate(), json!(null)));
        assert_eq!(table.stats.snapshot().responses_unclaimed, 1);
    }

    #[tokio::test]
    async fn test_guard_drop_reaps_entry() {
        let table = table();
        let id = CorrelationId::generate();
        let (rx, guard) = table.register(id);
        assert_eq!(table.len(), 1);

        drop(rx);
        drop(guard);
        assert_eq!(table.len(), 0);
        assert_eq!(table.stats.snapshot().requests_abandoned, 1);

        // A late response finds no entry.
        assert!(!table.complete(id, json!(1)));
    }

    #[tokio::test]
    async fn test_guard_noop_after_completion() {
        let table = table();
        let id = CorrelationId::generate();
        let (rx, guard) = table.register(id);

        table.complete(id, json!(7));
        rx.await.unwrap();
        drop(guard);
        assert_eq!(table.stats.snapshot().requests_abandoned, 0);
    }

    #[tokio::test]
    async fn test_close_wakes_waiters_with_error() {
        let table = table();
        let (rx, _guard) = table.register(CorrelationId::generate());
        table.close();
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_register_after_close_resolves_immediately() {
        // A registration that loses the race with connection teardown
        // must not strand its waiter: the entry is never inserted and
        // the receiver errors at once.
        let table = table();
        table.close();

        let (rx, guard) = table.register(CorrelationId::generate());
        assert_eq!(table.len(), 0);
        assert!(rx.await.is_err());
        drop(guard);
        assert_eq!(table.stats.snapshot().requests_abandoned, 0);
    }
}
