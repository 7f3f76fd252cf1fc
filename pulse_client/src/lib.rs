// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pulse client SDK: the transport manager for a remote-monitoring
//! dashboard.
//!
//! One long-lived TCP connection is shared by any number of concurrent
//! callers. Each request carries a fresh correlation ID; a single
//! background I/O task multiplexes the outbound queue and the inbound
//! byte stream, routing every response to exactly the waiter that owns
//! its ID.
//!
//! # Architecture
//!
//! ```text
//! PulseClient
//!   ├── outbound queue (mpsc, FIFO)      -- request frames
//!   ├── PendingTable (id -> oneshot)     -- one entry per waiter
//!   └── I/O task (select! loop)          -- sole owner of the socket
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pulse_client::{PulseClient, Topic};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PulseClient::connect("127.0.0.1:9600").build().await?;
//!
//!     let cpu = client.cpu().await?;
//!     println!("overall usage: {:.1}%", cpu.usage);
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

mod config;
mod error;
mod history;
mod metrics;
mod pager;
mod pending;
mod poll;
mod stats;
mod transport;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use history::{CpuUsageHistory, History, HISTORY_WINDOW};
pub use metrics::{
    CpuMetrics, DiskMetrics, HostInfo, HostProtocol, Metric, NetworkInterface, NetworkMetrics,
    PortStatus, ProcessInfo, RamMetrics, SystemInfo,
};
pub use pager::{paginate, Pager, PROCESSES_PER_PAGE};
pub use poll::Subscription;
pub use stats::{StatsSnapshot, TransportStats};
pub use transport::{ClientBuilder, PulseClient};

pub use pulse_wire::{CorrelationId, Envelope, Topic};
