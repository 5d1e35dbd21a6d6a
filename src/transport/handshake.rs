//! WebSocket upgrade request.
//!
//! The socket URL and the handshake headers are computed once, when the
//! connection is built, and validated there. Every (re)connect attempt
//! clones them into a fresh upgrade request.
//!
//! # Headers
//!
//! | Header | Value |
//! |--------|-------|
//! | `Cookie` | `ATERNOS_SESSION=<token>; ATERNOS_SERVER=<server id>` |
//! | `Origin` | `https://<host>` (or `http://` for plain endpoints) |
//! | `User-Agent` | From [`ConnectionOptions`] |
//! | `Accept-Language` | From [`ConnectionOptions`] |
//! | extra | Any [`ConnectionOptions::with_header`] entries |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{
    ACCEPT_LANGUAGE, COOKIE, HeaderName, HeaderValue, ORIGIN, USER_AGENT,
};
use url::Url;

use crate::config::{ConnectionOptions, Endpoint};
use crate::error::{Error, Result};
use crate::identifiers::{ServerId, SessionToken};

// ============================================================================
// Constants
// ============================================================================

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "ATERNOS_SESSION";

/// Cookie carrying the target server id.
pub const SERVER_COOKIE: &str = "ATERNOS_SERVER";

// ============================================================================
// Handshake
// ============================================================================

/// Validated socket URL and upgrade headers.
#[derive(Clone)]
pub struct Handshake {
    url: Url,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Handshake {
    /// Builds the handshake for one server.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] / [`Error::Config`] if the socket URL cannot be built
    /// - [`Error::InvalidHeader`] if a header name or value is not valid HTTP
    pub fn new(
        endpoint: &Endpoint,
        server_id: &ServerId,
        token: &SessionToken,
        options: &ConnectionOptions,
    ) -> Result<Self> {
        let url = endpoint.socket_url(server_id)?;

        let cookie = format!(
            "{SESSION_COOKIE}={}; {SERVER_COOKIE}={}",
            token.expose(),
            server_id
        );

        let mut headers = vec![
            (COOKIE, header_value(COOKIE.as_str(), &cookie)?),
            (ORIGIN, header_value(ORIGIN.as_str(), &endpoint.origin())?),
            (USER_AGENT, header_value(USER_AGENT.as_str(), &options.user_agent)?),
            (
                ACCEPT_LANGUAGE,
                header_value(ACCEPT_LANGUAGE.as_str(), &options.accept_language)?,
            ),
        ];

        for (name, value) in &options.extra_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_header(name.as_str(), e))?;
            headers.push((header_name, header_value(name, value)?));
        }

        Ok(Self { url, headers })
    }

    /// Returns the socket URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the value of a handshake header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.as_str().eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.to_str().ok())
    }

    /// Creates a fresh upgrade request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebSocket`] if tungstenite rejects the URL.
    pub fn request(&self) -> Result<Request> {
        let mut request = self.url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
        Ok(request)
    }
}

impl fmt::Debug for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("Handshake")
            .field("url", &self.url.as_str())
            .field("headers", &names)
            .finish()
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::invalid_header(name, e))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::Scheme;

    fn handshake(options: &ConnectionOptions) -> Result<Handshake> {
        Handshake::new(
            &Endpoint::default(),
            &ServerId::new("AbC123"),
            &SessionToken::new("tok"),
            options,
        )
    }

    #[test]
    fn test_url_and_cookie() {
        let handshake = handshake(&ConnectionOptions::default()).unwrap();
        assert_eq!(handshake.url().as_str(), "wss://aternos.org/hermes/AbC123");
        assert_eq!(
            handshake.header("cookie"),
            Some("ATERNOS_SESSION=tok; ATERNOS_SERVER=AbC123")
        );
        assert_eq!(handshake.header("Origin"), Some("https://aternos.org"));
    }

    #[test]
    fn test_plain_endpoint() {
        let handshake = Handshake::new(
            &Endpoint::new(Scheme::Http, "127.0.0.1:9000"),
            &ServerId::new("s1"),
            &SessionToken::new("tok"),
            &ConnectionOptions::default(),
        )
        .unwrap();
        assert_eq!(handshake.url().as_str(), "ws://127.0.0.1:9000/hermes/s1");
        assert_eq!(handshake.header("origin"), Some("http://127.0.0.1:9000"));
    }

    #[test]
    fn test_extra_headers_are_added() {
        let options = ConnectionOptions::default().with_header("X-Trace", "abc");
        let handshake = handshake(&options).unwrap();
        assert_eq!(handshake.header("x-trace"), Some("abc"));
    }

    #[test]
    fn test_invalid_header_value_is_rejected() {
        let options = ConnectionOptions::default().with_user_agent("bad\nagent");
        assert!(matches!(
            handshake(&options),
            Err(Error::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_request_carries_headers() {
        let handshake = handshake(&ConnectionOptions::default()).unwrap();
        let request = handshake.request().unwrap();
        assert_eq!(request.uri(), "wss://aternos.org/hermes/AbC123");
        assert!(request.headers().contains_key(COOKIE));
        assert!(request.headers().contains_key("sec-websocket-key"));
    }

    #[test]
    fn test_debug_hides_cookie_value() {
        let handshake = handshake(&ConnectionOptions::default()).unwrap();
        let debug = format!("{handshake:?}");
        assert!(debug.contains("cookie"));
        assert!(!debug.contains("tok"));
    }
}
