//! Multiplexed streams.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`StreamKind`] | Closed set of streams the remote offers |
//! | [`Stream`] | Desired vs. actual run state of one stream |
//! | [`StreamRegistry`] | Active streams, created lazily by name |
//! | [`FrameSink`] | Outbound seam a stream reconciles through |

// ============================================================================
// Submodules
// ============================================================================

/// Known stream kinds.
pub mod kind;

/// Stream registry.
pub mod registry;

/// Stream state machine.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use kind::StreamKind;
pub use registry::StreamRegistry;
pub use state::{Action, Emission, FrameSink, Stream, StreamObservers};
