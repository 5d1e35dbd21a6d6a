//! Aternos hermes - resilient live-connection client.
//!
//! This library keeps one persistent WebSocket connection to a server's
//! `hermes` endpoint and multiplexes named live streams over it.
//!
//! # Architecture
//!
//! The client is built around desired vs. actual state:
//!
//! - **Streams** record whether the caller wants them running and whether
//!   the remote confirmed they run
//! - **Reconciliation** sends whatever `start`/`stop` frame closes the gap,
//!   on readiness, on status updates and on a fixed interval
//! - **Reconnection** reopens the socket after an unexpected close until
//!   the caller disconnects
//!
//! Key design principles:
//!
//! - One socket task per connection attempt, fed through a command channel
//! - Events from superseded sockets never touch current state
//! - Observers run without any internal lock held
//! - Malformed inbound frames are logged and dropped
//!
//! # Quick Start
//!
//! ```no_run
//! use aternos_hermes::{Connection, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let connection = Connection::builder()
//!         .token("session-token")
//!         .server_id("AbC123")
//!         .build()?;
//!
//!     connection.on_ready(|| println!("ready"));
//!     connection.on_status(|status| println!("status: {:?}", status.label));
//!
//!     let console = connection.stream("console")?;
//!     console.on_data("line", |line| println!("{line:?}"));
//!     console.start(None);
//!
//!     connection.connect();
//!     tokio::signal::ctrl_c().await?;
//!     connection.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Builder, options and endpoint |
//! | [`connection`] | [`Connection`] and [`StreamHandle`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Server id, session token, subscription id |
//! | [`observer`] | Typed callback lists |
//! | [`protocol`] | Wire frames |
//! | [`status`] | Status snapshots and the [`StatusModel`] seam |
//! | [`stream`] | Stream state machine and registry |
//! | [`transport`] | Upgrade handshake and socket task |

// ============================================================================
// Modules
// ============================================================================

/// Connection configuration.
///
/// Use [`Connection::builder()`] to create a configured connection.
pub mod config;

/// Connection manager and stream handles.
pub mod connection;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Observer registrations.
pub mod observer;

/// Wire protocol frame types.
pub mod protocol;

/// Server status snapshots.
pub mod status;

/// Multiplexed stream state.
pub mod stream;

/// WebSocket transport layer.
///
/// Internal module handling the upgrade request and the socket task.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration types
pub use config::{ConnectionBuilder, ConnectionOptions, Endpoint, Scheme};

// Connection types
pub use connection::{Connection, ConnectionState, StreamHandle};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ServerId, SessionToken, SubscriptionId};

// Protocol types
pub use protocol::StreamEvent;

// Status types
pub use status::{ServerStatus, StatusModel, StatusRecord};

// Stream types
pub use stream::StreamKind;
