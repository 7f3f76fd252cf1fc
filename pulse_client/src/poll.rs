// SPDX-License-Identifier: MIT OR Apache-2.0
//! Periodic topic refresh.
//!
//! Pages that chart a time series re-request their topic on a fixed
//! interval. A [`Subscription`] drives that loop on its own task and
//! stops when dropped, when explicitly stopped, or when the
//! connection goes away.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use pulse_wire::Topic;

use crate::error::ClientError;
use crate::transport::PulseClient;

/// Handle to a periodic refresh task.
///
/// Dropping the handle signals the task to stop after its current
/// request settles.
pub struct Subscription {
    topic: Topic,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// The topic this subscription refreshes.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        self.topic
    }

    /// Whether the refresh task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the refresh task and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.handle.await;
    }
}

impl PulseClient {
    /// Refresh `topic` on the configured default interval, handing
    /// each payload to `on_update`.
    pub fn subscribe<F>(&self, topic: Topic, on_update: F) -> Subscription
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.subscribe_every(topic, self.config().refresh_interval, on_update)
    }

    /// Refresh `topic` every `interval`, handing each payload to
    /// `on_update`. The first request fires immediately.
    pub fn subscribe_every<F>(
        &self,
        topic: Topic,
        interval: Duration,
        mut on_update: F,
    ) -> Subscription
    where
        F: FnMut(Value) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let client = self.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {},
                }

                tokio::select! {
                    // Stopping mid-request drops the request future,
                    // which reaps its pending-table entry.
                    _ = stop_rx.changed() => break,
                    result = client.request(topic) => match result {
                        Ok(value) => on_update(value),
                        Err(ClientError::Closed | ClientError::ConnectionLost) => {
                            tracing::debug!(%topic, "subscription ending: connection gone");
                            break;
                        },
                        Err(e) => {
                            tracing::warn!(%topic, "refresh failed: {e}");
                        },
                    },
                }
            }
        });

        Subscription {
            topic,
            stop_tx,
            handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    use pulse_wire::{Envelope, FrameCodec};

    use super::*;

    async fn echo_server() -> (std::net::SocketAddr, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let codec = FrameCodec::default();
            let (mut stream, _) = listener.accept().await.unwrap();
            while let Ok(Some(request)) = codec.read_frame(&mut stream).await {
                let response = Envelope::response(request.id, json!({"tick": true}));
                if codec.write_frame(&mut stream, &response).await.is_err() {
                    break;
                }
            }
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_subscription_delivers_repeatedly() {
        let (addr, server) = echo_server().await;
        let client = PulseClient::connect(addr.to_string()).build().await.unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let mut done_tx = Some(done_tx);

        let sub = client.subscribe_every(Topic::Cpu, Duration::from_millis(10), move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                if let Some(tx) = done_tx.take() {
                    let _ = tx.send(());
                }
            }
        });

        timeout(Duration::from_secs(5), done_rx).await.unwrap().unwrap();
        assert_eq!(sub.topic(), Topic::Cpu);
        sub.stop().await;
        assert!(count.load(Ordering::SeqCst) >= 3);

        client.close().await;
        server.abort();
    }

    #[tokio::test]
    async fn test_subscription_ends_on_close() {
        let (addr, server) = echo_server().await;
        let client = PulseClient::connect(addr.to_string()).build().await.unwrap();

        let sub = client.subscribe_every(Topic::Ram, Duration::from_millis(10), |_| {});
        client.close().await;

        // The next refresh attempt observes the closed client and exits.
        timeout(Duration::from_secs(5), async {
            while !sub.is_finished() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        server.abort();
    }

    #[tokio::test]
    async fn test_dropping_subscription_stops_task() {
        let (addr, server) = echo_server().await;
        let client = PulseClient::connect(addr.to_string()).build().await.unwrap();

        let sub = client.subscribe_every(Topic::Disk, Duration::from_millis(10), |_| {});
        let task_handle = sub.handle.abort_handle();
        drop(sub);

        timeout(Duration::from_secs(5), async {
            while !task_handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        client.close().await;
        server.abort();
    }
}
