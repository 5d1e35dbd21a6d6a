//! WebSocket transport layer.
//!
//! This module owns everything that touches the network.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │   Connection    │                              │   Remote        │
//! │                 │         WebSocket            │   (hermes)      │
//! │  SocketHandle ──┼─► socket task ◄─────────────►│                 │
//! │  SocketEvents ◄─┼──                            │  /hermes/{id}   │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Handshake::request` - Build the upgrade request (URL + headers)
//! 2. `socket::spawn` - Start a socket task for one generation
//! 3. `SocketEvents::on_open` / `on_message` - Upgrade done, frames in order
//! 4. `SocketHandle::send_text` - Queue outbound frames
//! 5. `SocketEvents::on_close` - Reported once when the task ends
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `handshake` | Socket URL and upgrade headers |
//! | `socket` | Socket task and its handle |

// ============================================================================
// Submodules
// ============================================================================

/// Socket URL and upgrade headers.
pub mod handshake;

/// Socket task.
pub mod socket;

// ============================================================================
// Re-exports
// ============================================================================

pub use handshake::Handshake;
pub use socket::{SocketEvents, SocketHandle};
