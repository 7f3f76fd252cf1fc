// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `{id, data}` record carried by every frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correlation::CorrelationId;
use crate::topic::Topic;

/// One correlated message, in either direction.
///
/// Requests put the topic string in `data`; responses put the metric
/// payload there. The transport never looks inside response data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Correlation ID tying a response back to its request.
    pub id: CorrelationId,
    /// Topic string (requests) or opaque metric value (responses).
    pub data: Value,
}

impl Envelope {
    /// Build a request for `topic` with a fresh correlation ID.
    #[must_use]
    pub fn request(topic: Topic) -> Self {
        Self {
            id: CorrelationId::generate(),
            data: Value::String(topic.as_str().to_owned()),
        }
    }

    /// Build a response to the request identified by `id`.
    #[must_use]
    pub const fn response(id: CorrelationId, data: Value) -> Self {
        Self { id, data }
    }

    /// Interpret `data` as a request topic.
    #[must_use]
    pub fn topic(&self) -> Option<Topic> {
        self.data.as_str().and_then(|s| s.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_carries_topic_string() {
        let env = Envelope::request(Topic::Disk);
        assert_eq!(env.data, json!("disk"));
        assert_eq!(env.topic(), Some(Topic::Disk));
    }

    #[test]
    fn test_response_echoes_id() {
        let req = Envelope::request(Topic::Cpu);
        let resp = Envelope::response(req.id, json!({"usage": 42}));
        assert_eq!(resp.id, req.id);
        assert!(resp.topic().is_none());
    }

    #[test]
    fn test_json_shape() {
        let req = Envelope::request(Topic::Ram);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["id"], json!(req.id.to_string()));
        assert_eq!(value["data"], json!("ram"));
    }
}
