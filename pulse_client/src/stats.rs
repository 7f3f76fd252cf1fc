//! Transport counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters maintained by the transport and its I/O task.
#[derive(Debug, Default)]
pub struct TransportStats {
    /// Requests written to the wire.
    pub requests_sent: AtomicU64,
    /// Responses delivered to a waiter.
    pub responses_received: AtomicU64,
    /// Responses that arrived after their waiter gave up.
    pub responses_unclaimed: AtomicU64,
    /// Waiters that dropped before their response arrived.
    pub requests_abandoned: AtomicU64,
    /// Bytes written to the socket.
    pub bytes_sent: AtomicU64,
    /// Bytes read from the socket.
    pub bytes_received: AtomicU64,
}

impl TransportStats {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_send(&self, bytes: usize) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_recv_bytes(&self, bytes: usize) {
        self.bytes_received
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.responses_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unclaimed(&self) {
        self.responses_unclaimed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abandoned(&self) {
        self.requests_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            responses_received: self.responses_received.load(Ordering::Relaxed),
            responses_unclaimed: self.responses_unclaimed.load(Ordering::Relaxed),
            requests_abandoned: self.requests_abandoned.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`TransportStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Requests written to the wire.
    pub requests_sent: u64,
    /// Responses delivered to a waiter.
    pub responses_received: u64,
    /// Responses that arrived after their waiter gave up.
    pub responses_unclaimed: u64,
    /// Waiters that dropped before their response arrived.
    pub requests_abandoned: u64,
    /// Bytes written to the socket.
    pub bytes_sent: u64,
    /// Bytes read from the socket.
    pub bytes_received: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = TransportStats::new();
        stats.record_send(10);
        stats.record_send(5);
        stats.record_recv_bytes(7);
        stats.record_delivered();
        stats.record_unclaimed();
        stats.record_abandoned();

        let snap = stats.snapshot();
        assert_eq!(snap.requests_sent, 2);
        assert_eq!(snap.bytes_sent, 15);
        assert_eq!(snap.bytes_received, 7);
        assert_eq!(snap.responses_received, 1);
        assert_eq!(snap.responses_unclaimed, 1);
        assert_eq!(snap.requests_abandoned, 1);
    }
}
