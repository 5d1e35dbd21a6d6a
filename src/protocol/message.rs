//! Inbound envelope parsing and classification.
//!
//! Parsing is split from dispatch: this module turns a text frame into a
//! [`Route`] without touching any connection state, and the connection's
//! router acts on the result.
//!
//! # Format
//!
//! ```json
//! { "type": "line", "stream": "console", "data": "..." }
//! { "type": "status", "message": "{\"class\":\"online\"}" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Liveness frame, carries nothing.
pub const KEEP_ALIVE: &str = "keep-alive";

/// Remote is prepared to accept stream operations.
pub const READY: &str = "ready";

/// Remote session attached.
pub const CONNECTED: &str = "connected";

/// Remote session dropped, independently of the socket.
pub const DISCONNECTED: &str = "disconnected";

/// Server status update.
pub const STATUS: &str = "status";

/// Stream start acknowledgement.
pub const STARTED: &str = "started";

/// Stream stop acknowledgement.
pub const STOPPED: &str = "stopped";

// ============================================================================
// InboundMessage
// ============================================================================

/// A frame from remote end to local end.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundMessage {
    /// Message type.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Stream name, for stream-scoped frames.
    #[serde(default)]
    pub stream: Option<String>,

    /// Payload, for stream data frames.
    #[serde(default)]
    pub data: Option<Value>,

    /// Nested JSON text, for `status` frames.
    #[serde(default)]
    pub message: Option<Value>,
}

impl InboundMessage {
    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the frame is not a JSON object with a
    /// string `type`.
    pub fn from_text(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Classifies the message for dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for a `status` frame whose `message` is
    /// missing or is not JSON-encoded text.
    pub fn route(self) -> Result<Route> {
        let route = match self.message_type.as_str() {
            KEEP_ALIVE => Route::KeepAlive,
            READY => Route::Ready,
            CONNECTED => Route::Connected,
            DISCONNECTED => Route::Disconnected,
            STATUS => Route::Status(self.decode_status()?),
            _ => match self.stream.clone() {
                Some(stream) => Route::Stream {
                    stream,
                    signal: StreamSignal::from(self),
                },
                None => Route::Unhandled(self),
            },
        };
        Ok(route)
    }

    /// Decodes the doubly-encoded status payload.
    fn decode_status(&self) -> Result<Value> {
        match &self.message {
            Some(Value::String(text)) => serde_json::from_str(text)
                .map_err(|e| Error::protocol(format!("Invalid status payload: {e}"))),
            Some(other) => Err(Error::protocol(format!(
                "Status message must be JSON text, got {other}"
            ))),
            None => Err(Error::protocol("Status frame without message")),
        }
    }
}

// ============================================================================
// Route
// ============================================================================

/// Where an inbound frame goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Liveness only.
    KeepAlive,
    /// Readiness handshake.
    Ready,
    /// Remote session attached.
    Connected,
    /// Remote session dropped.
    Disconnected,
    /// Decoded status object.
    Status(Value),
    /// Stream-scoped frame.
    Stream {
        /// Target stream name.
        stream: String,
        /// What the stream should do with it.
        signal: StreamSignal,
    },
    /// Unknown control frame without a stream.
    Unhandled(InboundMessage),
}

// ============================================================================
// StreamSignal
// ============================================================================

/// A stream-scoped frame, as seen by the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    /// Remote confirmed the stream is running.
    Started,
    /// Remote confirmed the stream is stopped.
    Stopped,
    /// Any other stream frame.
    Data {
        /// Frame type.
        event_type: String,
        /// Frame payload.
        data: Option<Value>,
    },
}

impl From<InboundMessage> for StreamSignal {
    fn from(message: InboundMessage) -> Self {
        match message.message_type.as_str() {
            STARTED => Self::Started,
            STOPPED => Self::Stopped,
            _ => Self::Data {
                event_type: message.message_type,
                data: message.data,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
