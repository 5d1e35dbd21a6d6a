//! Hermes wire protocol message types.
//!
//! Every frame is a JSON text message carrying a `type` and, for
//! stream-scoped traffic, the `stream` it belongs to.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`OutboundFrame`] | Local → Remote | Stream start/stop and stream commands |
//! | [`InboundMessage`] | Remote → Local | Control signals and stream data |
//! | [`StreamEvent`] | Local observers | Generic stream event envelope |
//!
//! # Control Types
//!
//! | `type` | Meaning |
//! |--------|---------|
//! | `keep-alive` | Liveness only |
//! | `ready` | Remote accepts stream operations |
//! | `connected` / `disconnected` | Remote session attached / dropped |
//! | `status` | Server status, JSON-encoded again inside `message` |
//! | `started` / `stopped` | Stream acknowledgements |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | Generic stream event envelope |
//! | `frame` | Outbound frame |
//! | `message` | Inbound envelope and routing classification |

// ============================================================================
// Submodules
// ============================================================================

/// Generic stream event envelope.
pub mod event;

/// Outbound frame serialization.
pub mod frame;

/// Inbound envelope parsing and classification.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::StreamEvent;
pub use frame::OutboundFrame;
pub use message::{InboundMessage, Route, StreamSignal};
