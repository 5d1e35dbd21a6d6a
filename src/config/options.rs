//! Connection behaviour options.
//!
//! Controls reconnection, reconciliation timing and the browser-like
//! headers sent with the upgrade request.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use aternos_hermes::ConnectionOptions;
//!
//! let options = ConnectionOptions::new()
//!     .with_reconnect_delay(Duration::from_secs(5))
//!     .with_reconcile_interval(Duration::from_secs(30))
//!     .with_header("X-Debug", "1");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Delay before each reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Upper bound on one WebSocket upgrade.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Period of the stream reconciliation timer.
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(15);

/// Browser-like user agent sent with the upgrade.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:134.0) Gecko/20100101 Firefox/134.0";

/// Accept-Language sent with the upgrade.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

// ============================================================================
// ConnectionOptions
// ============================================================================

/// Connection behaviour configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Reconnect after an unexpected close while a connection is desired.
    pub auto_reconnect: bool,

    /// Fixed delay before each reconnect attempt, and before retrying
    /// streams after the remote reports `disconnected`.
    pub reconnect_delay: Duration,

    /// Time allowed for the upgrade before the attempt counts as failed.
    pub connect_timeout: Duration,

    /// Period of the stream reconciliation timer.
    pub reconcile_interval: Duration,

    /// `User-Agent` header value.
    pub user_agent: String,

    /// `Accept-Language` header value.
    pub accept_language: String,

    /// Additional upgrade headers.
    pub extra_headers: Vec<(String, String)>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            extra_headers: Vec::new(),
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectionOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectionOptions {
    /// Enables or disables automatic reconnection.
    #[inline]
    #[must_use]
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Sets the reconnect delay.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the upgrade timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the reconciliation period.
    #[inline]
    #[must_use]
    pub fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = interval;
        self
    }

    /// Sets the `User-Agent` header.
    #[inline]
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the `Accept-Language` header.
    #[inline]
    #[must_use]
    pub fn with_accept_language(mut self, language: impl Into<String>) -> Self {
        self.accept_language = language.into();
        self
    }

    /// Adds a custom upgrade header.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ConnectionOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a delay, timeout or period is zero.
    pub fn validate(&self) -> Result<()> {
        if self.reconnect_delay.is_zero() {
            return Err(Error::config("Reconnect delay must be greater than zero"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::config("Connect timeout must be greater than zero"));
        }
        if self.reconcile_interval.is_zero() {
            return Err(Error::config(
                "Reconcile interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
