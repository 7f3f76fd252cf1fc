// SPDX-License-Identifier: MIT OR Apache-2.0
//! Test helpers for the Pulse client: a scriptable mock metrics server.
//!
//! The mock binds `127.0.0.1:0`, accepts a single connection, and
//! replies to each framed request according to its [`ReplyMode`]. It
//! records every topic it receives in arrival order so tests can
//! assert on wire ordering.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use pulse_wire::{Envelope, FrameCodec, Topic};

/// Install a fmt subscriber honoring `RUST_LOG`, once per process.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// How the mock server answers requests.
#[derive(Debug, Clone)]
pub enum ReplyMode {
    /// Reply with `{"id": <request id>, "topic": <request topic>}`.
    Echo,
    /// Reply with the full typed payload for the requested topic.
    Canned,
    /// Reply with the same fixed value for every request.
    Fixed(Value),
    /// Collect `batch` requests, then reply to them in reverse order.
    Reversed {
        /// Requests to buffer before replying.
        batch: usize,
    },
    /// Reply like `Echo`, but split each response frame into two
    /// writes separated by a pause.
    SplitWrites {
        /// Bytes written before the pause.
        first: usize,
        /// Pause between the two writes.
        delay: Duration,
    },
    /// Reply like `Echo` after a pause.
    Delayed(Duration),
    /// Reply with a well-formed length prefix framing bytes that are
    /// not a valid envelope, then keep the connection open.
    CorruptFrame,
    /// Read requests but never reply.
    Silent,
    /// Read one request, then close the connection.
    HangUp,
}

/// A one-connection mock metrics server.
pub struct MockServer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Bind a listener and spawn the serving task.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind.
    pub async fn spawn(mode: ReplyMode) -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&received);
        let handle = tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            serve(stream, mode, log).await;
        });

        Self {
            addr,
            received,
            handle,
        }
    }

    /// Address the server is listening on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Topics received so far, in arrival order.
    #[must_use]
    pub fn received_topics(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Tear the server down.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

async fn serve(mut stream: TcpStream, mode: ReplyMode, log: Arc<Mutex<Vec<String>>>) {
    let codec = FrameCodec::default();
    let mut buffered: Vec<Envelope> = Vec::new();

    loop {
        let request = match codec.read_frame(&mut stream).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) | Err(_) => break,
        };

        let topic = request.data.as_str().unwrap_or_default().to_string();
        log.lock().push(topic.clone());

        match &mode {
            ReplyMode::Echo => {
                let response = Envelope::response(request.id, echo_payload(&request));
                if codec.write_frame(&mut stream, &response).await.is_err() {
                    break;
                }
            },
            ReplyMode::Canned => {
                let payload = topic
                    .parse::<Topic>()
                    .map(canned_payload)
                    .unwrap_or(Value::Null);
                let response = Envelope::response(request.id, payload);
                if codec.write_frame(&mut stream, &response).await.is_err() {
                    break;
                }
            },
            ReplyMode::Fixed(value) => {
                let response = Envelope::response(request.id, value.clone());
                if codec.write_frame(&mut stream, &response).await.is_err() {
                    break;
                }
            },
            ReplyMode::Reversed { batch } => {
                buffered.push(request);
                if buffered.len() == *batch {
                    for pending in buffered.drain(..).rev() {
                        let response = Envelope::response(pending.id, echo_payload(&pending));
                        if codec.write_frame(&mut stream, &response).await.is_err() {
                            return;
                        }
                    }
                }
            },
            ReplyMode::SplitWrites { first, delay } => {
                let response = Envelope::response(request.id, echo_payload(&request));
                let frame = match codec.encode(&response) {
                    Ok(frame) => frame,
                    Err(_) => break,
                };
                let split = (*first).min(frame.len());

                if stream.write_all(&frame[..split]).await.is_err() {
                    break;
                }
                let _ = stream.flush().await;
                sleep(*delay).await;
                if stream.write_all(&frame[split..]).await.is_err() {
                    break;
                }
                let _ = stream.flush().await;
            },
            ReplyMode::Delayed(delay) => {
                sleep(*delay).await;
                let response = Envelope::response(request.id, echo_payload(&request));
                if codec.write_frame(&mut stream, &response).await.is_err() {
                    break;
                }
            },
            ReplyMode::CorruptFrame => {
                let garbage = b"not an envelope";
                let mut frame = u32::try_from(garbage.len()).unwrap().to_be_bytes().to_vec();
                frame.extend_from_slice(garbage);
                if stream.write_all(&frame).await.is_err() {
                    break;
                }
                let _ = stream.flush().await;
            },
            ReplyMode::Silent => {},
            ReplyMode::HangUp => break,
        }
    }
}

fn echo_payload(request: &Envelope) -> Value {
    json!({
        "id": request.id.to_string(),
        "topic": request.data,
    })
}

/// The full typed payload the mock serves for `topic` in
/// [`ReplyMode::Canned`].
#[must_use]
pub fn canned_payload(topic: Topic) -> Value {
    match topic {
        Topic::System => json!({
            "name": "testhost",
            "system": "Linux",
            "platform": "Linux-6.1.0-x86_64",
            "release": "6.1.0",
            "version": "#1 SMP"
        }),
        Topic::Cpu => json!({
            "name": "Mock CPU @ 2.8GHz",
            "architecture": "x86_64",
            "bits": 64,
            "min_frequency": 800_000_000.0,
            "max_frequency": 4_200_000_000.0,
            "current_frequency": 2_800_000_000.0,
            "physical_cores": 2,
            "logical_cores": 4,
            "usage": 42.0,
            "cores_usage": [40.0, 42.0, 44.0, 42.0]
        }),
        Topic::Ram => json!({
            "total_gb": 16.0,
            "used_gb": 8.0,
            "available_gb": 8.0,
            "percent_usage": 50.0
        }),
        Topic::Disk => json!({
            "size_gb": 512.0,
            "used_gb": 256.0,
            "used_percent": 50.0,
            "available_gb": 256.0,
            "available_percent": 50.0
        }),
        Topic::Network => json!({
            "interfaces": [
                {"interface": "lo", "address": "127.0.0.1", "netmask": "255.0.0.0"}
            ],
            "hosts": [{
                "host": "192.168.0.1",
                "name": "router",
                "state": "up",
                "protocols": [
                    {"protocol": "tcp", "ports": [{"port": 80, "state": "open"}]}
                ]
            }]
        }),
        Topic::Processes => json!([
            {
                "name": "init",
                "used_memory": 1.5,
                "memory_use_percent": 0.1,
                "used_threads": 1,
                "created_time": "00:00:01",
                "created_date": "2026-08-30"
            },
            {
                "name": "pulse-agent",
                "used_memory": 24.0,
                "memory_use_percent": 1.4,
                "used_threads": 8,
                "created_time": "02:13:45",
                "created_date": "2026-08-30"
            }
        ]),
    }
}
