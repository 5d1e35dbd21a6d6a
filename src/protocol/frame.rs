//! Outbound frame.
//!
//! # Format
//!
//! ```json
//! { "stream": "console", "type": "start", "data": { ... } }
//! ```
//!
//! `data` is omitted entirely when there is no payload.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Frame type asking the remote to start a stream.
pub const START: &str = "start";

/// Frame type asking the remote to stop a stream.
pub const STOP: &str = "stop";

// ============================================================================
// OutboundFrame
// ============================================================================

/// A frame from local end to remote end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundFrame {
    /// Target stream name.
    pub stream: String,

    /// Frame type.
    #[serde(rename = "type")]
    pub frame_type: String,

    /// Optional payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl OutboundFrame {
    /// Creates a new frame.
    #[inline]
    #[must_use]
    pub fn new(stream: impl Into<String>, frame_type: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            stream: stream.into(),
            frame_type: frame_type.into(),
            data,
        }
    }

    /// Serializes the frame to its JSON text form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the payload cannot be serialized.
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
