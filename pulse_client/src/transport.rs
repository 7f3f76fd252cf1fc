// SPDX-License-Identifier: MIT OR Apache-2.0
//! The transport manager: one socket, one I/O task, many waiters.
//!
//! [`PulseClient`] owns a single TCP connection for its lifetime. Any
//! number of tasks may call [`request`](PulseClient::request)
//! concurrently; each registers a completion channel under a fresh
//! correlation ID and enqueues its frame on the FIFO outbound queue.
//! The background I/O task is the only code that touches the socket:
//! it drains the queue one frame per write, accumulates inbound bytes
//! into complete frames, and routes each response to the waiter that
//! owns its ID.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use pulse_wire::{Envelope, FrameCodec, Topic, WireResult};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::metrics::{
    CpuMetrics, DiskMetrics, Metric, NetworkMetrics, ProcessInfo, RamMetrics, SystemInfo,
};
use crate::pending::PendingTable;
use crate::stats::{StatsSnapshot, TransportStats};

/// Builder for connecting a [`PulseClient`].
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a builder for the given server address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(address),
        }
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the per-iteration read chunk size.
    #[must_use]
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size.max(1);
        self
    }

    /// Set the maximum wire frame size.
    #[must_use]
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Build the client and connect to the server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] if the socket cannot be
    /// established within the configured timeout.
    pub async fn build(self) -> Result<PulseClient> {
        PulseClient::with_config(self.config).await
    }
}

struct ClientInner {
    config: ClientConfig,
    outbound_tx: mpsc::UnboundedSender<Vec<u8>>,
    pending: Arc<PendingTable>,
    stats: Arc<TransportStats>,
    codec: FrameCodec,
    running: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    io_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

/// Client for a Pulse monitoring server.
///
/// Cheap to clone; all clones share the same connection.
#[derive(Clone)]
pub struct PulseClient {
    inner: Arc<ClientInner>,
}

impl PulseClient {
    /// Create a builder for connecting to a server.
    #[must_use]
    pub fn connect(address: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(address)
    }

    /// Connect with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] if the socket cannot be
    /// established within the configured timeout.
    pub async fn with_config(config: ClientConfig) -> Result<Self> {
        tracing::info!("connecting to {}", config.address);

        let stream = timeout(config.connect_timeout, TcpStream::connect(&config.address))
            .await
            .map_err(|_| {
                ClientError::Connection(format!("connect to {} timed out", config.address))
            })?
            .map_err(|e| ClientError::Connection(format!("failed to connect: {e}")))?;

        stream
            .set_nodelay(true)
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let (read_half, write_half) = stream.into_split();

        let stats = Arc::new(TransportStats::new());
        let pending = Arc::new(PendingTable::new(Arc::clone(&stats)));
        let codec = FrameCodec::new(config.max_frame_size);
        let running = Arc::new(AtomicBool::new(true));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let io_task = tokio::spawn(io_loop(IoLoop {
            read_half,
            write_half,
            outbound_rx,
            shutdown_rx,
            pending: Arc::clone(&pending),
            stats: Arc::clone(&stats),
            codec: codec.clone(),
            chunk_size: config.read_chunk_size,
            running: Arc::clone(&running),
        }));

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                outbound_tx,
                pending,
                stats,
                codec,
                running,
                shutdown_tx,
                io_task: parking_lot::Mutex::new(Some(io_task)),
            }),
        })
    }

    /// Request one fresh sample for `topic` and wait for its response.
    ///
    /// Suspends only the calling task. Concurrent calls are
    /// independent: each gets exactly the response matching its own
    /// correlation ID, in whatever order the server replies. Dropping
    /// the returned future (e.g. under `tokio::time::timeout`) removes
    /// the in-flight entry, so a late response is discarded instead of
    /// leaking.
    ///
    /// # Errors
    ///
    /// [`ClientError::Closed`] after `close()`,
    /// [`ClientError::ConnectionLost`] if the connection drops while
    /// waiting, or a wire error if the request cannot be encoded.
    pub async fn request(&self, topic: Topic) -> Result<Value> {
        if !self.inner.running.load(Ordering::SeqCst) {
            return Err(ClientError::Closed);
        }

        let envelope = Envelope::request(topic);
        let frame = self.inner.codec.encode(&envelope)?;

        // Register before enqueueing so the response cannot race the
        // table insert.
        let (rx, _guard) = self.inner.pending.register(envelope.id);

        self.inner
            .outbound_tx
            .send(frame)
            .map_err(|_| ClientError::Closed)?;

        rx.await.map_err(|_| ClientError::ConnectionLost)
    }

    /// Callback form of [`request`](Self::request) for callers that
    /// cannot await, such as a render loop.
    ///
    /// Spawns an independent task; the callback receives the result.
    pub fn spawn_request<F>(&self, topic: Topic, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move {
            on_complete(client.request(topic).await);
        })
    }

    async fn fetch_as<T: DeserializeOwned>(&self, topic: Topic) -> Result<T> {
        let value = self.request(topic).await?;
        serde_json::from_value(value).map_err(|source| ClientError::Decode { topic, source })
    }

    /// Fetch and decode the payload for any topic.
    ///
    /// # Errors
    ///
    /// Everything [`request`](Self::request) returns, plus
    /// [`ClientError::Decode`] for a malformed payload.
    pub async fn metric(&self, topic: Topic) -> Result<Metric> {
        let value = self.request(topic).await?;
        Metric::decode(topic, value)
    }

    /// Fetch host and operating system identification.
    ///
    /// # Errors
    ///
    /// See [`metric`](Self::metric).
    pub async fn system(&self) -> Result<SystemInfo> {
        self.fetch_as(Topic::System).await
    }

    /// Fetch CPU metrics.
    ///
    /// # Errors
    ///
    /// See [`metric`](Self::metric).
    pub async fn cpu(&self) -> Result<CpuMetrics> {
        self.fetch_as(Topic::Cpu).await
    }

    /// Fetch memory metrics.
    ///
    /// # Errors
    ///
    /// See [`metric`](Self::metric).
    pub async fn ram(&self) -> Result<RamMetrics> {
        self.fetch_as(Topic::Ram).await
    }

    /// Fetch disk metrics.
    ///
    /// # Errors
    ///
    /// See [`metric`](Self::metric).
    pub async fn disk(&self) -> Result<DiskMetrics> {
        self.fetch_as(Topic::Disk).await
    }

    /// Fetch network interfaces and scanned hosts.
    ///
    /// # Errors
    ///
    /// See [`metric`](Self::metric).
    pub async fn network(&self) -> Result<NetworkMetrics> {
        self.fetch_as(Topic::Network).await
    }

    /// Fetch the process list.
    ///
    /// # Errors
    ///
    /// See [`metric`](Self::metric).
    pub async fn processes(&self) -> Result<Vec<ProcessInfo>> {
        self.fetch_as(Topic::Processes).await
    }

    /// Stop the I/O task and close the connection.
    ///
    /// Waits up to the configured shutdown timeout for the task to
    /// exit; returns promptly if it already has. Outstanding waiters
    /// observe [`ClientError::ConnectionLost`]; subsequent requests
    /// fail with [`ClientError::Closed`].
    pub async fn close(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        let _ = self.inner.shutdown_tx.send(true);

        let handle = self.inner.io_task.lock().take();
        if let Some(handle) = handle {
            if timeout(self.inner.config.shutdown_timeout, handle)
                .await
                .is_err()
            {
                tracing::warn!("i/o task did not exit within the shutdown timeout");
            }
        }
    }

    /// Whether the connection is still up and accepting requests.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Number of requests currently awaiting a response.
    #[must_use]
    pub fn outstanding_requests(&self) -> usize {
        self.inner.pending.len()
    }

    /// Current transport counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

struct IoLoop {
    read_half: OwnedReadHalf,
    write_half: OwnedWriteHalf,
    outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    shutdown_rx: watch::Receiver<bool>,
    pending: Arc<PendingTable>,
    stats: Arc<TransportStats>,
    codec: FrameCodec,
    chunk_size: usize,
    running: Arc<AtomicBool>,
}

/// The connection's single I/O loop.
///
/// Multiplexes three events: the shutdown signal, socket readability,
/// and the outbound queue. Reads come in fixed-size chunks and are
/// accumulated until at least one complete frame can be drained; each
/// outbound frame is written in full before the next iteration.
async fn io_loop(mut io: IoLoop) {
    let mut chunk = vec![0u8; io.chunk_size];
    let mut accumulated: Vec<u8> = Vec::new();

    let exit_reason = loop {
        tokio::select! {
            // Resolves on close() and when the last client handle drops.
            _ = io.shutdown_rx.changed() => break "shutdown",

            read = io.read_half.read(&mut chunk) => match read {
                Ok(0) => break "peer closed",
                Ok(n) => {
                    io.stats.record_recv_bytes(n);
                    accumulated.extend_from_slice(&chunk[..n]);
                    if let Err(e) = drain_frames(&io.codec, &mut accumulated, &io.pending) {
                        tracing::error!("protocol error: {e}");
                        break "protocol error";
                    }
                },
                Err(e) => {
                    tracing::debug!("read error: {e}");
                    break "read error";
                },
            },

            maybe_frame = io.outbound_rx.recv() => match maybe_frame {
                Some(frame) => {
                    if let Err(e) = write_frame(&mut io.write_half, &frame).await {
                        tracing::debug!("write error: {e}");
                        break "write error";
                    }
                    io.stats.record_send(frame.len());
                },
                None => break "client dropped",
            },
        }
    };

    tracing::debug!(reason = exit_reason, "i/o loop exiting");
    io.running.store(false, Ordering::SeqCst);
    // Wake every outstanding waiter with a closed channel and refuse
    // late registrations, so a request racing this teardown cannot
    // park an entry nothing will complete.
    io.pending.close();
}

async fn write_frame(writer: &mut OwnedWriteHalf, frame: &[u8]) -> std::io::Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await
}

/// Drain every complete frame out of the accumulation buffer and route
/// it to its waiter. Leftover bytes are a partial frame and stay put.
fn drain_frames(codec: &FrameCodec, buf: &mut Vec<u8>, pending: &PendingTable) -> WireResult<()> {
    while let Some(envelope) = codec.decode_buf(buf)? {
        if !pending.complete(envelope.id, envelope.data) {
            tracing::debug!(id = %envelope.id, "response had no waiter");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    async fn echo_server() -> (std::net::SocketAddr, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let codec = FrameCodec::default();
            let (mut stream, _) = listener.accept().await.unwrap();
            while let Ok(Some(request)) = codec.read_frame(&mut stream).await {
                let topic = request.data.clone();
                let response = Envelope::response(request.id, json!({ "topic": topic }));
                if codec.write_frame(&mut stream, &response).await.is_err() {
                    break;
                }
            }
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Port 1 on localhost is almost certainly closed.
        let result = PulseClient::connect("127.0.0.1:1").build().await;
        assert!(matches!(result, Err(ClientError::Connection(_))));
    }

    #[tokio::test]
    async fn test_request_roundtrip() {
        let (addr, server) = echo_server().await;
        let client = PulseClient::connect(addr.to_string()).build().await.unwrap();

        let value = client.request(Topic::Cpu).await.unwrap();
        assert_eq!(value, json!({ "topic": "cpu" }));
        assert_eq!(client.outstanding_requests(), 0);

        let stats = client.stats();
        assert_eq!(stats.requests_sent, 1);
        assert_eq!(stats.responses_received, 1);

        client.close().await;
        server.abort();
    }

    #[tokio::test]
    async fn test_request_after_close_fails_fast() {
        let (addr, server) = echo_server().await;
        let client = PulseClient::connect(addr.to_string()).build().await.unwrap();

        client.close().await;
        assert!(!client.is_running());
        assert!(matches!(
            client.request(Topic::Ram).await,
            Err(ClientError::Closed)
        ));
        server.abort();
    }

    #[tokio::test]
    async fn test_close_twice_does_not_hang() {
        let (addr, server) = echo_server().await;
        let client = PulseClient::connect(addr.to_string()).build().await.unwrap();

        client.close().await;
        // Second close finds no task handle and returns immediately.
        timeout(std::time::Duration::from_secs(1), client.close())
            .await
            .unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn test_server_disconnect_fails_waiters() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // Accept, read one frame, then slam the connection shut.
            let codec = FrameCodec::default();
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = codec.read_frame(&mut stream).await;
            drop(stream);
        });

        let client = PulseClient::connect(addr.to_string()).build().await.unwrap();
        let result = client.request(Topic::Disk).await;
        assert!(matches!(result, Err(ClientError::ConnectionLost)));
        assert_eq!(client.outstanding_requests(), 0);

        server.await.unwrap();
        client.close().await;
    }

    #[tokio::test]
    async fn test_spawn_request_invokes_callback_once() {
        let (addr, server) = echo_server().await;
        let client = PulseClient::connect(addr.to_string()).build().await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = client.spawn_request(Topic::Network, move |result| {
            tx.send(result.unwrap()).unwrap();
        });

        handle.await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), json!({ "topic": "network" }));
        assert!(rx.try_recv().is_err());

        client.close().await;
        server.abort();
    }
}
