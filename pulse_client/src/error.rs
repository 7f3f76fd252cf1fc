// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the Pulse client SDK.

use thiserror::Error;

use pulse_wire::Topic;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur in client operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Establishing the connection failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The client was closed; no further requests are accepted.
    #[error("client is closed")]
    Closed,

    /// The connection dropped while a request was outstanding.
    #[error("connection lost before a response arrived")]
    ConnectionLost,

    /// Wire protocol error.
    #[error(transparent)]
    Wire(#[from] pulse_wire::WireError),

    /// A response payload did not match the expected shape for its topic.
    #[error("malformed {topic} payload: {source}")]
    Decode {
        /// Topic whose payload failed to decode.
        topic: Topic,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
