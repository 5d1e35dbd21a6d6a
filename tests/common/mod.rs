//! Shared fixtures: an in-process hermes server and polling helpers.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use aternos_hermes::{Connection, ConnectionOptions, Endpoint, Scheme};

type HandshakeResult = std::result::Result<Response, ErrorResponse>;

/// How long a test waits for something that should happen.
pub const PATIENCE: Duration = Duration::from_secs(5);

// ============================================================================
// Tracing
// ============================================================================

static TRACING: Once = Once::new();

/// Installs a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// MockServer
// ============================================================================

/// Accepts hermes sockets on a loopback port.
pub struct MockServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl MockServer {
    /// Binds an ephemeral port.
    pub async fn bind() -> Result<Self> {
        Self::bind_to("127.0.0.1:0".parse()?).await
    }

    /// Binds a specific address, e.g. to come back on a released port.
    pub async fn bind_to(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(Scheme::Http, self.addr.to_string())
    }

    /// Accepts the next socket.
    pub async fn accept(&self) -> Result<Peer> {
        timeout(PATIENCE, self.accept_inner())
            .await
            .context("no connection attempt")?
    }

    /// Returns `true` if a client connects within `window`.
    pub async fn accepts_within(&self, window: Duration) -> bool {
        timeout(window, self.listener.accept()).await.is_ok()
    }

    async fn accept_inner(&self) -> Result<Peer> {
        let (stream, _) = self.listener.accept().await?;

        let mut path = String::new();
        let mut headers = Vec::new();
        let ws = accept_hdr_async(stream, |request: &Request, response: Response| -> HandshakeResult {
            path = request.uri().path().to_string();
            headers = request
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        value.to_str().unwrap_or_default().to_string(),
                    )
                })
                .collect();
            Ok(response)
        })
        .await?;

        Ok(Peer { ws, path, headers })
    }
}

// ============================================================================
// StalledServer
// ============================================================================

/// Accepts TCP connections and never answers the upgrade.
pub struct StalledServer {
    addr: SocketAddr,
    accepts: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl StalledServer {
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let accepts = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepts);
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(stream);
            }
        });

        Ok(Self {
            addr,
            accepts,
            task,
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(Scheme::Http, self.addr.to_string())
    }

    /// Number of TCP connections accepted so far.
    pub fn accepts(&self) -> usize {
        self.accepts.load(Ordering::SeqCst)
    }
}

impl Drop for StalledServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Peer
// ============================================================================

/// Server side of one accepted socket.
pub struct Peer {
    ws: WebSocketStream<TcpStream>,
    pub path: String,
    headers: Vec<(String, String)>,
}

impl Peer {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub async fn send_json(&mut self, value: Value) -> Result<()> {
        self.send_text(&value.to_string()).await
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.ws.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Sends `ready`, as the remote does once the session is attached.
    pub async fn ready(&mut self) -> Result<()> {
        self.send_json(serde_json::json!({"type": "ready"})).await
    }

    /// Receives the next text frame as JSON.
    pub async fn recv_json(&mut self) -> Result<Value> {
        self.recv_within(PATIENCE)
            .await?
            .context("socket closed while waiting for a frame")
    }

    /// Receives the next text frame, or `None` if the socket closed.
    pub async fn recv_within(&mut self, window: Duration) -> Result<Option<Value>> {
        let deadline = Instant::now() + window;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let message = timeout(remaining, self.ws.next())
                .await
                .context("no frame received")?;
            match message {
                Some(Ok(Message::Text(text))) => return Ok(Some(serde_json::from_str(&text)?)),
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return Ok(None),
                Some(Ok(_)) => {}
            }
        }
    }

    /// Asserts nothing arrives for `window`.
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match timeout(window, self.ws.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => bail!("unexpected frame: {text}"),
            Ok(other) => bail!("unexpected socket event: {other:?}"),
        }
    }

    /// Returns once the client closed the socket.
    pub async fn closed(&mut self) -> Result<()> {
        loop {
            match timeout(PATIENCE, self.ws.next())
                .await
                .context("socket still open")?
            {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return Ok(()),
                Some(Ok(_)) => {}
            }
        }
    }

    /// Closes from the server side.
    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        while let Some(Ok(_)) = self.ws.next().await {}
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Options with test-friendly timings.
pub fn fast_options() -> ConnectionOptions {
    ConnectionOptions::new()
        .with_reconnect_delay(Duration::from_millis(100))
        .with_reconcile_interval(Duration::from_secs(60))
}

/// Builds a connection to `server`.
pub fn connection(server: &MockServer, options: ConnectionOptions) -> Result<Connection> {
    connection_to(server.endpoint(), options)
}

/// Builds a connection to an arbitrary endpoint.
pub fn connection_to(endpoint: Endpoint, options: ConnectionOptions) -> Result<Connection> {
    Ok(Connection::builder()
        .token("test-token")
        .server_id("s1")
        .endpoint(endpoint)
        .options(options)
        .build()?)
}

/// Polls `condition` until it holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> Result<()> {
    let deadline = Instant::now() + PATIENCE;
    while !condition() {
        if Instant::now() >= deadline {
            bail!("condition not reached in time");
        }
        sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}
