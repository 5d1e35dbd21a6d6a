//! Socket task.
//!
//! Each connection attempt spawns one tokio task that owns the
//! `WebSocketStream` for its whole life:
//!
//! 1. Performs the upgrade (bounded by a timeout, cancellable by a close
//!    command)
//! 2. Reports `open`, then every text frame in arrival order
//! 3. Writes frames queued through [`SocketHandle`]
//! 4. Reports `close` exactly once when it ends, whatever the reason
//!
//! Events carry the attempt's generation so the owner can ignore a socket
//! it has already replaced.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Weak;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};

// ============================================================================
// SocketEvents
// ============================================================================

/// Receiver of socket lifecycle events.
pub trait SocketEvents: Send + Sync + 'static {
    /// Upgrade completed.
    fn on_open(&self, generation: u64);

    /// Text frame received.
    fn on_message(&self, generation: u64, text: &str);

    /// Transport error. A `close` always follows.
    fn on_error(&self, generation: u64, error: Error);

    /// Socket gone (closed, failed or cancelled).
    fn on_close(&self, generation: u64);
}

// ============================================================================
// SocketCommand / SocketHandle
// ============================================================================

/// Commands for the socket task.
#[derive(Debug)]
enum SocketCommand {
    /// Write a text frame.
    Send(String),
    /// Close the socket and end the task.
    Close,
}

/// Sending side of one socket task.
#[derive(Debug, Clone)]
pub struct SocketHandle {
    command_tx: mpsc::UnboundedSender<SocketCommand>,
    generation: u64,
}

impl SocketHandle {
    /// Returns the attempt's generation.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Queues a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the task has ended.
    pub fn send_text(&self, text: String) -> Result<()> {
        self.command_tx
            .send(SocketCommand::Send(text))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Asks the task to close the socket.
    pub fn close(&self) {
        let _ = self.command_tx.send(SocketCommand::Close);
    }
}

// ============================================================================
// Spawn
// ============================================================================

/// Spawns a socket task for one connection attempt.
///
/// An upgrade that has not completed within `connect_timeout` is reported
/// as [`Error::Connection`] followed by `close`.
///
/// Must be called from within a tokio runtime.
pub fn spawn<E: SocketEvents>(
    request: Request,
    generation: u64,
    connect_timeout: Duration,
    events: Weak<E>,
) -> SocketHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    tokio::spawn(run(request, generation, connect_timeout, command_rx, events));

    SocketHandle {
        command_tx,
        generation,
    }
}

/// Task body.
async fn run<E: SocketEvents>(
    request: Request,
    generation: u64,
    connect_timeout: Duration,
    mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
    events: Weak<E>,
) {
    debug!(generation, uri = %request.uri(), ?connect_timeout, "Connecting WebSocket");

    let ws_stream = tokio::select! {
        result = time::timeout(connect_timeout, connect_async(request)) => match result {
            Ok(Ok((stream, response))) => {
                debug!(generation, status = %response.status(), "WebSocket upgraded");
                stream
            }
            Ok(Err(e)) => {
                warn!(generation, error = %e, "WebSocket connect failed");
                notify(&events, |events| {
                    events.on_error(generation, Error::WebSocket(e));
                    events.on_close(generation);
                });
                return;
            }
            Err(_elapsed) => {
                warn!(generation, ?connect_timeout, "WebSocket upgrade timed out");
                notify(&events, |events| {
                    events.on_error(generation, Error::connection("upgrade timed out"));
                    events.on_close(generation);
                });
                return;
            }
        },

        () = wait_for_close(&mut command_rx) => {
            debug!(generation, "Connect cancelled");
            notify(&events, |events| events.on_close(generation));
            return;
        }
    };

    notify(&events, |events| events.on_open(generation));

    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            // Incoming frames from the remote
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        trace!(generation, len = text.len(), "Frame received");
                        let Some(events) = events.upgrade() else {
                            break;
                        };
                        events.on_message(generation, text.as_str());
                    }

                    Some(Ok(Message::Close(frame))) => {
                        debug!(generation, ?frame, "WebSocket closed by remote");
                        break;
                    }

                    Some(Err(e)) => {
                        error!(generation, error = %e, "WebSocket error");
                        notify(&events, |events| events.on_error(generation, Error::WebSocket(e)));
                        break;
                    }

                    None => {
                        debug!(generation, "WebSocket stream ended");
                        break;
                    }

                    // Ignore Binary, Ping, Pong
                    _ => {}
                }
            }

            // Commands from the connection
            command = command_rx.recv() => {
                match command {
                    Some(SocketCommand::Send(text)) => {
                        if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                            error!(generation, error = %e, "Failed to send frame");
                            notify(&events, |events| events.on_error(generation, Error::WebSocket(e)));
                            break;
                        }
                        trace!(generation, "Frame sent");
                    }

                    Some(SocketCommand::Close) | None => {
                        debug!(generation, "Closing WebSocket");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    notify(&events, |events| events.on_close(generation));

    debug!(generation, "Socket task terminated");
}

/// Resolves once a close is requested or every handle is dropped.
///
/// Frames queued before the upgrade completes are dropped; the connection
/// never reports ready that early.
async fn wait_for_close(command_rx: &mut mpsc::UnboundedReceiver<SocketCommand>) {
    loop {
        match command_rx.recv().await {
            Some(SocketCommand::Send(_)) => {
                warn!("Frame queued before upgrade, dropped");
            }
            Some(SocketCommand::Close) | None => return,
        }
    }
}

fn notify<E: SocketEvents>(events: &Weak<E>, f: impl FnOnce(&E)) {
    if let Some(events) = events.upgrade() {
        f(&events);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;
    use tokio::net::TcpListener;
    use tokio::sync::Notify;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct Log {
        entries: Mutex<Vec<String>>,
        errors: Mutex<Vec<Error>>,
        closed: Notify,
    }

    impl SocketEvents for Log {
        fn on_open(&self, generation: u64) {
            self.entries.lock().push(format!("open:{generation}"));
        }

        fn on_message(&self, generation: u64, text: &str) {
            self.entries.lock().push(format!("message:{generation}:{text}"));
        }

        fn on_error(&self, generation: u64, error: Error) {
            self.entries.lock().push(format!("error:{generation}"));
            self.errors.lock().push(error);
        }

        fn on_close(&self, generation: u64) {
            self.entries.lock().push(format!("close:{generation}"));
            self.closed.notify_one();
        }
    }

    #[tokio::test]
    async fn test_refused_connection_reports_error_then_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let log = Arc::new(Log::default());
        let request = format!("ws://127.0.0.1:{port}/hermes/x")
            .into_client_request()
            .unwrap();
        let _handle = spawn(request, 7, TIMEOUT, Arc::downgrade(&log));

        log.closed.notified().await;
        assert_eq!(*log.entries.lock(), ["error:7", "close:7"]);
    }

    #[tokio::test]
    async fn test_unanswered_upgrade_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accepts TCP and holds it open without ever answering the upgrade.
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
            drop(tcp);
        });

        let log = Arc::new(Log::default());
        let request = format!("ws://127.0.0.1:{port}/hermes/x")
            .into_client_request()
            .unwrap();
        let _handle = spawn(request, 4, Duration::from_millis(200), Arc::downgrade(&log));

        time::timeout(Duration::from_secs(5), log.closed.notified())
            .await
            .expect("stalled upgrade never closed");
        assert_eq!(*log.entries.lock(), ["error:4", "close:4"]);
        assert!(matches!(
            log.errors.lock().as_slice(),
            [Error::Connection { .. }]
        ));

        server.abort();
    }

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            ws.send(Message::Text("hello".into())).await.unwrap();
            let reply = ws.next().await.unwrap().unwrap();
            assert_eq!(reply.into_text().unwrap().as_str(), "pong");
        });

        let log = Arc::new(Log::default());
        let request = format!("ws://127.0.0.1:{port}/")
            .into_client_request()
            .unwrap();
        let handle = spawn(request, 1, TIMEOUT, Arc::downgrade(&log));

        while !log.entries.lock().iter().any(|e| e.starts_with("message")) {
            tokio::task::yield_now().await;
        }
        handle.send_text("pong".to_string()).unwrap();
        server.await.unwrap();
        handle.close();

        log.closed.notified().await;
        let entries = log.entries.lock().clone();
        assert_eq!(entries[0], "open:1");
        assert_eq!(entries[1], "message:1:hello");
        assert_eq!(entries.last().unwrap(), "close:1");
    }
}
