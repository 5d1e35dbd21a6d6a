//! Remote endpoint.
//!
//! The site is addressed by scheme and host; the socket URL swaps the scheme
//! for its WebSocket counterpart and appends `/hermes/{server id}`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ServerId;

// ============================================================================
// Constants
// ============================================================================

/// Default site host.
pub const DEFAULT_HOST: &str = "aternos.org";

/// Path segment in front of the server id.
pub const SOCKET_PATH: &str = "hermes";

// ============================================================================
// Scheme
// ============================================================================

/// Site scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Plain HTTP, socket over `ws`.
    Http,
    /// HTTPS, socket over `wss`.
    #[default]
    Https,
}

impl Scheme {
    /// Returns the HTTP scheme name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Returns the matching WebSocket scheme name.
    #[inline]
    #[must_use]
    pub const fn socket_scheme(self) -> &'static str {
        match self {
            Self::Http => "ws",
            Self::Https => "wss",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// Site the socket lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(Scheme::Https, DEFAULT_HOST)
    }
}

impl Endpoint {
    /// Creates an endpoint. `host` may carry a port (`127.0.0.1:9000`).
    #[inline]
    #[must_use]
    pub fn new(scheme: Scheme, host: impl Into<String>) -> Self {
        Self {
            scheme,
            host: host.into(),
        }
    }

    /// Parses a site base URL such as `https://aternos.org`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `base` is not a URL
    /// - [`Error::Config`] if the scheme is not `http`/`https` or there is no host
    pub fn parse(base: &str) -> Result<Self> {
        let url = Url::parse(base)?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(Error::config(format!(
                    "Unsupported scheme '{other}', expected http or https"
                )));
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| Error::config(format!("No host in '{base}'")))?;

        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self::new(scheme, host))
    }

    /// Returns the scheme.
    #[inline]
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns the host (with port, if any).
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the `Origin` header value.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// Builds the socket URL for `server_id`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if the host does not form a valid URL
    /// - [`Error::Config`] if the server id is empty
    pub fn socket_url(&self, server_id: &ServerId) -> Result<Url> {
        if server_id.as_str().is_empty() {
            return Err(Error::config("Server id must not be empty"));
        }

        let mut url = Url::parse(&format!(
            "{}://{}/",
            self.scheme.socket_scheme(),
            self.host
        ))?;

        url.path_segments_mut()
            .map_err(|()| Error::config(format!("Host '{}' cannot carry a path", self.host)))?
            .clear()
            .push(SOCKET_PATH)
            .push(server_id.as_str());

        Ok(url)
    }
}

// ============================================================================
// Tests
// ============================================================================
