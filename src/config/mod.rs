//! Connection configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConnectionBuilder`] | Fluent, validated construction of a [`Connection`](crate::Connection) |
//! | [`ConnectionOptions`] | Reconnect/reconcile timing and upgrade headers |
//! | [`Endpoint`] | Site scheme and host the socket URL is derived from |
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use aternos_hermes::{Connection, ConnectionOptions, Endpoint};
//!
//! # fn example() -> aternos_hermes::Result<()> {
//! let connection = Connection::builder()
//!     .token("session-token")
//!     .server_id("AbC123")
//!     .endpoint(Endpoint::parse("https://aternos.org")?)
//!     .options(ConnectionOptions::new().with_reconnect_delay(Duration::from_secs(5)))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for connections.
pub mod builder;

/// Site endpoint.
pub mod endpoint;

/// Behaviour options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ConnectionBuilder;
pub use endpoint::{Endpoint, Scheme};
pub use options::ConnectionOptions;
