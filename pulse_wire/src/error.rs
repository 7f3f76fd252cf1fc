//! Error types for the wire protocol.

use thiserror::Error;

/// Result type for wire operations.
pub type WireResult<T> = std::result::Result<T, WireError>;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WireError {
    /// Frame exceeds the configured maximum size.
    #[error("frame too large: {size} bytes (max {max_size})")]
    FrameTooLarge {
        /// Actual frame size in bytes.
        size: usize,
        /// Configured maximum frame size.
        max_size: usize,
    },

    /// Frame is structurally invalid.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// JSON serialization or deserialization failed.
    ///
    /// On the read path this is a real protocol error, not a partial
    /// frame: the length prefix guarantees the payload is complete
    /// before it is parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
