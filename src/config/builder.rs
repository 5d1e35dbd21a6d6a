//! Builder pattern for connection configuration.
//!
//! Provides a fluent API for configuring and creating [`Connection`] instances.
//!
//! # Example
//!
//! ```no_run
//! use aternos_hermes::Connection;
//!
//! # fn example() -> aternos_hermes::Result<()> {
//! let connection = Connection::builder()
//!     .token("session-token")
//!     .server_id("AbC123")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::identifiers::{ServerId, SessionToken};
use crate::status::{StatusModel, StatusRecord};
use crate::transport::Handshake;

use super::{ConnectionOptions, Endpoint};

// ============================================================================
// ConnectionBuilder
// ============================================================================

/// Builder for configuring a [`Connection`].
///
/// Use [`Connection::builder()`] to create a new builder.
#[derive(Default)]
pub struct ConnectionBuilder {
    /// Session token from the login layer.
    token: Option<SessionToken>,
    /// Target server.
    server_id: Option<ServerId>,
    /// Site endpoint.
    endpoint: Endpoint,
    /// Behaviour options.
    options: ConnectionOptions,
    /// Status model, [`StatusRecord`] when unset.
    status_model: Option<Box<dyn StatusModel>>,
}

impl fmt::Debug for ConnectionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionBuilder")
            .field("token", &self.token)
            .field("server_id", &self.server_id)
            .field("endpoint", &self.endpoint)
            .field("options", &self.options)
            .field("status_model", &self.status_model.is_some())
            .finish()
    }
}

// ============================================================================
// ConnectionBuilder Implementation
// ============================================================================

impl ConnectionBuilder {
    /// Creates a new builder with no credentials.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session token.
    #[inline]
    #[must_use]
    pub fn token(mut self, token: impl Into<SessionToken>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the target server id.
    #[inline]
    #[must_use]
    pub fn server_id(mut self, server_id: impl Into<ServerId>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }

    /// Sets the site endpoint (default `https://aternos.org`).
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the behaviour options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the model `status` frames are applied to.
    #[inline]
    #[must_use]
    pub fn status_model(mut self, model: impl StatusModel + 'static) -> Self {
        self.status_model = Some(Box::new(model));
        self
    }

    /// Builds the connection with validation.
    ///
    /// The connection starts disconnected; call
    /// [`Connection::connect`] from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the token or server id is missing or empty
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::InvalidHeader`] / [`Error::InvalidUrl`] if the handshake cannot be built
    pub fn build(self) -> Result<Connection> {
        let token = self.validate_token()?;
        let server_id = self.validate_server_id()?;
        self.options.validate()?;

        let handshake = Handshake::new(&self.endpoint, &server_id, &token, &self.options)?;
        let status_model = self
            .status_model
            .unwrap_or_else(|| Box::new(StatusRecord::new()));

        Ok(Connection::new(handshake, self.options, status_model))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ConnectionBuilder {
    /// Validates the token configuration.
    fn validate_token(&self) -> Result<SessionToken> {
        let token = self.token.clone().ok_or_else(|| {
            Error::config(
                "Session token is required. Use .token() to set it.\n\
                 Example: Connection::builder().token(\"...\")",
            )
        })?;

        if token.expose().is_empty() {
            return Err(Error::config("Session token must not be empty"));
        }

        Ok(token)
    }

    /// Validates the server id configuration.
    fn validate_server_id(&self) -> Result<ServerId> {
        let server_id = self.server_id.clone().ok_or_else(|| {
            Error::config(
                "Server id is required. Use .server_id() to set it.\n\
                 Example: Connection::builder().server_id(\"AbC123\")",
            )
        })?;

        if server_id.as_str().is_empty() {
            return Err(Error::config("Server id must not be empty"));
        }

        Ok(server_id)
    }
}

// ============================================================================
// Tests
// ============================================================================
