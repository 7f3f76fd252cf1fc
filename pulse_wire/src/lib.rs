// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire protocol for the Pulse monitoring dashboard.
//!
//! Every message on the wire is one self-contained frame:
//!
//! ```text
//! +------------------+------------------+
//! | Length (4B BE)   | Payload (JSON)   |
//! +------------------+------------------+
//! ```
//!
//! The payload is a single [`Envelope`]: `{"id": <uuid>, "data": ...}`.
//! For requests `data` carries the [`Topic`] string; for responses it
//! carries the opaque metric value produced by the server.
//!
//! # Example
//!
//! ```
//! use pulse_wire::{Envelope, FrameCodec, Topic};
//!
//! let codec = FrameCodec::default();
//! let request = Envelope::request(Topic::Cpu);
//! let frame = codec.encode(&request).unwrap();
//!
//! let mut buf = frame;
//! let decoded = codec.decode_buf(&mut buf).unwrap().unwrap();
//! assert_eq!(decoded.id, request.id);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

mod codec;
mod correlation;
mod envelope;
mod error;
mod topic;

pub use codec::{FrameCodec, DEFAULT_MAX_FRAME_SIZE};
pub use correlation::CorrelationId;
pub use envelope::Envelope;
pub use error::{WireError, WireResult};
pub use topic::Topic;
