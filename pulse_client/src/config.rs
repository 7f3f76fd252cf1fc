//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use pulse_wire::DEFAULT_MAX_FRAME_SIZE;

/// Configuration for a [`PulseClient`](crate::PulseClient) connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address (`host:port`).
    pub address: String,

    /// Connection establishment timeout.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Bytes read from the socket per loop iteration.
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,

    /// Maximum size of one wire frame.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,

    /// Maximum time `close()` waits for the I/O task to exit.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: Duration,

    /// Default interval for [`subscribe`](crate::PulseClient::subscribe)
    /// driven refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: Duration,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_read_chunk_size() -> usize {
    1024
}

fn default_max_frame_size() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(4)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("localhost:9600")
    }
}

impl ClientConfig {
    /// Create a configuration for the given server address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: default_connect_timeout(),
            read_chunk_size: default_read_chunk_size(),
            max_frame_size: default_max_frame_size(),
            shutdown_timeout: default_shutdown_timeout(),
            refresh_interval: default_refresh_interval(),
        }
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-iteration read chunk size.
    #[must_use]
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Set the maximum frame size.
    #[must_use]
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the shutdown wait bound.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the default subscription refresh interval.
    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}
