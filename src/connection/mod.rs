//! Connection management.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Connection`] | Socket lifecycle, readiness, reconnection, reconciliation |
//! | [`ConnectionState`] | Socket-level state |
//! | [`StreamHandle`] | Start, stop and observe one stream |
//!
//! # Background tasks
//!
//! | Task | Lifetime |
//! |------|----------|
//! | socket | one per connection attempt, ends on close |
//! | reconnect | armed on unexpected close, cancelled on open or `disconnect()` |
//! | reconcile | every `reconcile_interval` between `connect()` and `disconnect()` |
//! | stream retry | armed by a remote `disconnected` frame |

// ============================================================================
// Submodules
// ============================================================================

mod handle;
mod manager;
mod router;
mod timer;

// ============================================================================
// Re-exports
// ============================================================================

pub use handle::StreamHandle;
pub use manager::{Connection, ConnectionState};
