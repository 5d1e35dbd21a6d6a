//! Connection manager.
//!
//! [`Connection`] owns the socket task, tracks connection and readiness
//! state, schedules reconnection and drives periodic stream reconciliation.
//! It is the only component that performs network I/O.
//!
//! # State
//!
//! | Field | Changed by |
//! |-------|------------|
//! | `state` | `connect()` → Connecting, open → Connected, close/`disconnect()` → Disconnected |
//! | `ready` | `ready` frame → true, any close → false |
//! | `desired` | `connect()` → true, `disconnect()` → false |
//! | `generation` | every new socket attempt and every `disconnect()` |
//!
//! Events from a socket whose generation is no longer current are ignored,
//! except `close`, which is still reported to observers.
//!
//! # Lock order
//!
//! `registry` may be held while `link` is taken (reconciliation sends
//! frames). No other lock is nested, and no lock is held while observers run.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info, trace};
use url::Url;

use crate::config::{ConnectionBuilder, ConnectionOptions};
use crate::error::{Error, Result};
use crate::identifiers::SubscriptionId;
use crate::observer::ConnectionObservers;
use crate::protocol::{OutboundFrame, StreamEvent};
use crate::status::{ServerStatus, StatusModel};
use crate::stream::{FrameSink, StreamKind, StreamRegistry};
use crate::transport::{Handshake, SocketEvents, SocketHandle, socket};

use super::handle::StreamHandle;
use super::router;
use super::timer::ScheduledTask;

// ============================================================================
// ConnectionState
// ============================================================================

/// Socket-level connection state.
///
/// Independent of readiness: a `Connected` socket only accepts stream
/// frames after the remote sends `ready`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No socket.
    #[default]
    Disconnected,
    /// Upgrade in progress.
    Connecting,
    /// Socket open.
    Connected,
}

impl ConnectionState {
    /// Returns the state name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Types
// ============================================================================

/// Socket bookkeeping, guarded as one unit.
#[derive(Debug, Default)]
struct Link {
    state: ConnectionState,
    ready: bool,
    desired: bool,
    generation: u64,
    socket: Option<SocketHandle>,
}

impl Link {
    fn is_ready(&self) -> bool {
        self.state == ConnectionState::Connected && self.ready
    }
}

/// Background timers owned by the connection.
#[derive(Debug, Default)]
struct Timers {
    /// Pending reconnect after an unexpected close.
    reconnect: Option<ScheduledTask>,
    /// Periodic stream reconciliation.
    reconcile: Option<ScheduledTask>,
    /// Stream retry after the remote reported `disconnected`.
    stream_retry: Option<ScheduledTask>,
}

/// Internal shared state.
pub(crate) struct ConnectionInner {
    handshake: Handshake,
    pub(super) options: ConnectionOptions,
    link: Mutex<Link>,
    timers: Mutex<Timers>,
    pub(super) registry: Mutex<StreamRegistry>,
    pub(super) status_model: Mutex<Box<dyn StatusModel>>,
    pub(super) latest_status: Mutex<Option<ServerStatus>>,
    pub(super) observers: ConnectionObservers,
    weak_self: Weak<ConnectionInner>,
}

// ============================================================================
// Connection
// ============================================================================

/// Persistent, self-healing connection to one server's hermes socket.
///
/// Cheap to clone; every clone drives the same socket. Dropping the last
/// clone (and every [`StreamHandle`]) closes the socket and cancels all
/// timers.
///
/// # Example
///
/// ```no_run
/// use aternos_hermes::Connection;
///
/// # async fn example() -> aternos_hermes::Result<()> {
/// let connection = Connection::builder()
///     .token("session-token")
///     .server_id("AbC123")
///     .build()?;
///
/// connection.on_status(|status| println!("server is {:?}", status.class));
///
/// let console = connection.stream("console")?;
/// console.on_data("line", |line| println!("{line:?}"));
/// console.start(None);
///
/// connection.connect();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.inner.handshake.url().as_str())
            .field("state", &self.state())
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Connection - Constructor
// ============================================================================

impl Connection {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Creates a disconnected connection.
    pub(crate) fn new(
        handshake: Handshake,
        options: ConnectionOptions,
        status_model: Box<dyn StatusModel>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak_self| ConnectionInner {
            handshake,
            options,
            link: Mutex::new(Link::default()),
            timers: Mutex::new(Timers::default()),
            registry: Mutex::new(StreamRegistry::new()),
            status_model: Mutex::new(status_model),
            latest_status: Mutex::new(None),
            observers: ConnectionObservers::default(),
            weak_self: weak_self.clone(),
        });

        Self { inner }
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &ConnectionInner {
        &self.inner
    }
}

// ============================================================================
// Connection - Lifecycle
// ============================================================================

impl Connection {
    /// Starts maintaining a connection.
    ///
    /// Opens a socket unless one is already open or opening, and arms the
    /// reconciliation timer. Returns immediately; progress is reported
    /// through `on_open` / `on_ready` / `on_close` / `on_error`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&self) {
        self.inner.connect();
    }

    /// Stops maintaining the connection.
    ///
    /// Closes the socket, cancels every timer and discards all streams.
    /// Idempotent.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Sends one frame.
    ///
    /// # Errors
    ///
    /// - [`Error::NotReady`] unless the socket is open and the remote sent `ready`
    /// - [`Error::Json`] if `data` cannot be serialized
    /// - [`Error::ConnectionClosed`] if the socket task already ended
    pub fn send(&self, stream: &str, frame_type: &str, data: Option<Value>) -> Result<()> {
        self.inner.send(stream, frame_type, data)
    }

    /// Runs reconciliation on every registered stream now.
    ///
    /// Returns how many start/stop frames went out.
    pub fn reconcile_streams(&self) -> usize {
        self.inner.reconcile_streams()
    }
}

// ============================================================================
// Connection - Accessors
// ============================================================================

impl Connection {
    /// Returns `true` while the socket is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Returns `true` while the socket is open and the remote is ready.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    /// Returns the socket state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.link.lock().state
    }

    /// Returns `true` between `connect()` and `disconnect()`.
    #[inline]
    #[must_use]
    pub fn is_desired(&self) -> bool {
        self.inner.link.lock().desired
    }

    /// Returns the socket URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        self.inner.handshake.url()
    }

    /// Returns the last status snapshot the model accepted.
    ///
    /// Kept across reconnects until the next accepted snapshot replaces it.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<ServerStatus> {
        self.inner.latest_status.lock().clone()
    }

    /// Returns the behaviour options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.inner.options
    }
}

// ============================================================================
// Connection - Streams
// ============================================================================

impl Connection {
    /// Returns the stream named `name`, registering it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStream`] if the remote offers no such stream.
    pub fn stream(&self, name: &str) -> Result<StreamHandle> {
        let kind = name.parse::<StreamKind>()?;
        Ok(self.stream_kind(kind))
    }

    /// Returns the stream of `kind`, registering it if needed.
    #[must_use]
    pub fn stream_kind(&self, kind: StreamKind) -> StreamHandle {
        self.inner.registry.lock().get_or_create(kind);
        StreamHandle::new(kind, Arc::clone(&self.inner))
    }

    /// Returns the registered stream kinds.
    #[must_use]
    pub fn streams(&self) -> Vec<StreamKind> {
        self.inner.registry.lock().kinds()
    }
}

// ============================================================================
// Connection - Observers
// ============================================================================

impl Connection {
    /// Called when a socket opens.
    pub fn on_open(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.inner.observers.open.subscribe(move |_| f())
    }

    /// Called when the remote signals readiness.
    pub fn on_ready(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.inner.observers.ready.subscribe(move |_| f())
    }

    /// Called when a socket closes or a connection attempt fails.
    pub fn on_close(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.inner.observers.close.subscribe(move |_| f())
    }

    /// Called on socket-level errors. A close always follows.
    pub fn on_error(&self, f: impl Fn(&Error) + Send + Sync + 'static) -> SubscriptionId {
        self.inner.observers.error.subscribe(f)
    }

    /// Called when the remote reports its session attached.
    pub fn on_connected(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.inner.observers.connected.subscribe(move |_| f())
    }

    /// Called when the remote reports its session dropped.
    pub fn on_disconnected(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.inner.observers.disconnected.subscribe(move |_| f())
    }

    /// Called with every applied status snapshot.
    pub fn on_status(&self, f: impl Fn(&ServerStatus) + Send + Sync + 'static) -> SubscriptionId {
        self.inner.observers.status.subscribe(f)
    }

    /// Called with every data frame of every stream.
    pub fn on_event(&self, f: impl Fn(&StreamEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.inner.observers.event.subscribe(f)
    }

    /// Removes a connection-level registration.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.observers.unsubscribe(id)
    }
}

// ============================================================================
// ConnectionInner - Lifecycle
// ============================================================================

impl ConnectionInner {
    fn connect(&self) {
        let result = {
            let mut link = self.link.lock();
            link.desired = true;
            if link.state == ConnectionState::Disconnected {
                self.open_socket(&mut link)
            } else {
                debug!(state = %link.state, "Connect requested while socket active");
                Ok(())
            }
        };

        if let Err(e) = result {
            error!(error = %e, "Failed to build upgrade request");
            self.observers.error.emit(&e);
        }

        self.arm_reconcile_timer();
    }

    /// Reconnect timer body. Never revives a connection nobody wants.
    fn reconnect(&self) {
        let result = {
            let mut link = self.link.lock();
            if !link.desired || link.state != ConnectionState::Disconnected {
                return;
            }
            self.open_socket(&mut link)
        };

        if let Err(e) = result {
            error!(error = %e, "Failed to build upgrade request");
            self.observers.error.emit(&e);
        }
    }

    fn open_socket(&self, link: &mut Link) -> Result<()> {
        let request = self.handshake.request()?;

        link.generation += 1;
        link.state = ConnectionState::Connecting;
        link.ready = false;
        link.socket = Some(socket::spawn(
            request,
            link.generation,
            self.options.connect_timeout,
            self.weak_self.clone(),
        ));

        info!(
            generation = link.generation,
            url = %self.handshake.url(),
            "Connecting"
        );
        Ok(())
    }

    fn disconnect(&self) {
        let socket = {
            let mut link = self.link.lock();
            link.desired = false;
            link.ready = false;
            link.state = ConnectionState::Disconnected;
            link.generation += 1;
            link.socket.take()
        };

        if let Some(socket) = &socket {
            debug!(generation = socket.generation(), "Closing socket");
            socket.close();
        }

        let cancelled = std::mem::take(&mut *self.timers.lock());
        drop(cancelled);

        self.registry.lock().clear();

        info!(closed_socket = socket.is_some(), "Disconnected");
    }

    pub(super) fn send(&self, stream: &str, frame_type: &str, data: Option<Value>) -> Result<()> {
        let link = self.link.lock();
        if !link.is_ready() {
            return Err(Error::not_ready(link.state, link.ready));
        }

        let socket = link.socket.as_ref().ok_or(Error::ConnectionClosed)?;
        let text = OutboundFrame::new(stream, frame_type, data).to_text()?;
        socket.send_text(text)?;

        trace!(stream, frame_type, "Frame queued");
        Ok(())
    }

    pub(super) fn is_ready(&self) -> bool {
        self.link.lock().is_ready()
    }

    /// Records the remote's readiness. Returns `false` if no socket is open.
    pub(super) fn mark_ready(&self) -> bool {
        let mut link = self.link.lock();
        if link.state != ConnectionState::Connected {
            return false;
        }
        link.ready = true;
        true
    }

    pub(super) fn reconcile_streams(&self) -> usize {
        let sent = self.registry.lock().reconcile_all(self);
        if sent > 0 {
            debug!(sent, "Streams reconciled");
        }
        sent
    }
}

// ============================================================================
// ConnectionInner - Timers
// ============================================================================

impl ConnectionInner {
    fn arm_reconcile_timer(&self) {
        let mut timers = self.timers.lock();
        if timers.reconcile.is_some() {
            return;
        }

        let weak = self.weak_self.clone();
        timers.reconcile = Some(ScheduledTask::every(
            "reconcile",
            self.options.reconcile_interval,
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.reconcile_streams();
                }
            },
        ));
    }

    fn arm_reconnect_timer(&self) {
        let weak = self.weak_self.clone();
        let task = ScheduledTask::after("reconnect", self.options.reconnect_delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.reconnect();
            }
        });
        self.timers.lock().reconnect = Some(task);

        debug!(
            delay_ms = self.options.reconnect_delay.as_millis() as u64,
            "Reconnect scheduled"
        );
    }

    /// Retries stream starts once the reconnect delay has passed.
    pub(super) fn schedule_stream_retry(&self) {
        let weak = self.weak_self.clone();
        let task = ScheduledTask::after("stream-retry", self.options.reconnect_delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.reconcile_streams();
            }
        });
        self.timers.lock().stream_retry = Some(task);
    }
}

// ============================================================================
// ConnectionInner - Socket Events
// ============================================================================

impl ConnectionInner {
    fn is_current(&self, generation: u64) -> bool {
        self.link.lock().generation == generation
    }
}

impl SocketEvents for ConnectionInner {
    fn on_open(&self, generation: u64) {
        {
            let mut link = self.link.lock();
            if link.generation != generation {
                debug!(generation, "Superseded socket opened, ignoring");
                return;
            }
            link.state = ConnectionState::Connected;
        }

        let cancelled = self.timers.lock().reconnect.take();
        drop(cancelled);

        info!(generation, url = %self.handshake.url(), "WebSocket open");
        self.observers.open.emit(&());
    }

    fn on_message(&self, generation: u64, text: &str) {
        if !self.is_current(generation) {
            trace!(generation, "Frame from superseded socket dropped");
            return;
        }
        router::dispatch(self, text);
    }

    fn on_error(&self, generation: u64, error: Error) {
        if !self.is_current(generation) {
            debug!(generation, error = %error, "Error on superseded socket");
            return;
        }
        self.observers.error.emit(&error);
    }

    fn on_close(&self, generation: u64) {
        let reconnect = {
            let mut link = self.link.lock();
            if link.generation == generation {
                link.state = ConnectionState::Disconnected;
                link.ready = false;
                link.socket = None;
                Some(self.options.auto_reconnect && link.desired)
            } else {
                None
            }
        };

        match reconnect {
            Some(reconnect) => {
                self.registry.lock().reset_all();
                if reconnect {
                    self.arm_reconnect_timer();
                }
                info!(generation, reconnect, "WebSocket closed");
            }
            None => debug!(generation, "Superseded socket closed"),
        }

        self.observers.close.emit(&());
    }
}

impl FrameSink for ConnectionInner {
    fn is_ready(&self) -> bool {
        ConnectionInner::is_ready(self)
    }

    fn send_frame(&self, stream: &str, frame_type: &str, data: Option<Value>) -> Result<()> {
        self.send(stream, frame_type, data)
    }
}

impl Drop for ConnectionInner {
    fn drop(&mut self) {
        if let Some(socket) = self.link.get_mut().socket.take() {
            socket.close();
        }
        debug!(url = %self.handshake.url(), "Connection dropped");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::status::StatusRecord;

    fn connection() -> Connection {
        Connection::builder()
            .token("tok")
            .server_id("s1")
            .build()
            .unwrap()
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_send_before_connect_is_not_ready() {
        let connection = connection();
        let err = connection.send("console", "start", None).unwrap_err();
        assert!(matches!(
            err,
            Error::NotReady {
                state: ConnectionState::Disconnected,
                ready: false
            }
        ));
    }

    #[test]
    fn test_stream_lookup() {
        let connection = connection();
        assert!(connection.stream("console").is_ok());
        assert!(matches!(
            connection.stream("chat"),
            Err(Error::UnknownStream { .. })
        ));
        assert_eq!(connection.streams(), [StreamKind::Console]);
    }

    #[test]
    fn test_disconnect_is_idempotent_and_clears_streams() {
        let connection = connection();
        connection.stream("console").unwrap();
        connection.disconnect();
        connection.disconnect();
        assert!(connection.streams().is_empty());
        assert!(!connection.is_desired());
    }

    #[test]
    fn test_ready_frame_without_socket_is_ignored() {
        let connection = connection();
        router::dispatch(&connection.inner, r#"{"type":"ready"}"#);
        assert!(!connection.is_ready());
    }

    #[test]
    fn test_stale_close_does_not_touch_state() {
        let connection = Connection::new(
            Handshake::new(
                &crate::config::Endpoint::default(),
                &"s1".into(),
                &"tok".into(),
                &ConnectionOptions::default(),
            )
            .unwrap(),
            ConnectionOptions::default(),
            Box::new(StatusRecord::new()),
        );

        connection.inner.link.lock().state = ConnectionState::Connected;
        connection.inner.link.lock().generation = 5;
        connection.inner.on_close(4);
        assert_eq!(connection.state(), ConnectionState::Connected);

        connection.inner.on_close(5);
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_on_open_ignores_superseded_generation() {
        let connection = connection();
        connection.inner.link.lock().generation = 3;
        connection.inner.on_open(2);
        assert!(!connection.is_connected());
        connection.inner.on_open(3);
        assert!(connection.is_connected());
    }
}
