//! Generic stream event envelope.
//!
//! Every data frame a stream receives is mirrored to observers as a
//! [`StreamEvent`], both on the stream itself and on the owning connection,
//! so callers can subscribe once for all streams.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

// ============================================================================
// StreamEvent
// ============================================================================

/// A data event received on one stream.
///
/// # Format
///
/// ```json
/// { "stream": "console", "type": "line", "data": "[Server] Done (3.2s)!" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamEvent {
    /// Name of the stream the frame arrived on.
    pub stream: String,

    /// Frame type as sent by the remote.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Frame payload, if any.
    pub data: Option<Value>,
}

impl StreamEvent {
    /// Creates a new stream event.
    #[inline]
    #[must_use]
    pub fn new(stream: impl Into<String>, event_type: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            stream: stream.into(),
            event_type: event_type.into(),
            data,
        }
    }

    /// Returns the payload as a string slice, if it is a JSON string.
    #[inline]
    #[must_use]
    pub fn data_str(&self) -> Option<&str> {
        self.data.as_ref().and_then(Value::as_str)
    }
}

// ============================================================================
// Tests
// ============================================================================
