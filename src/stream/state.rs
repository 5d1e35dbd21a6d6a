//! Per-stream state machine.
//!
//! A [`Stream`] tracks two independent flags: whether the caller wants it
//! running (`desired`) and whether the remote has acknowledged it running
//! (`actual`). Reconciliation compares them and sends at most one
//! start/stop frame, and only while the connection is ready:
//!
//! | actual | desired | ready | frame |
//! |--------|---------|-------|-------|
//! | stopped | yes | yes | `start` |
//! | started | no | yes | `stop` |
//! | * | * | no | none |
//!
//! There is no "pending" state. An unacknowledged start is simply sent again
//! on the next reconciliation.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::Result;
use crate::identifiers::SubscriptionId;
use crate::observer::{ConnectionObservers, Subscribers};
use crate::protocol::frame::{START, STOP};
use crate::protocol::{StreamEvent, StreamSignal};

use super::StreamKind;

// ============================================================================
// FrameSink
// ============================================================================

/// Where a stream sends its frames.
///
/// Implemented by the connection; tests substitute a recorder.
pub trait FrameSink {
    /// Returns `true` when the socket is open and the remote is ready.
    fn is_ready(&self) -> bool;

    /// Sends one frame for `stream`.
    ///
    /// # Errors
    ///
    /// Fails when the connection is not ready or the frame cannot be queued.
    fn send_frame(&self, stream: &str, frame_type: &str, data: Option<Value>) -> Result<()>;
}

// ============================================================================
// Action / Emission
// ============================================================================

/// Frame sent by a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A `start` frame went out.
    Start,
    /// A `stop` frame went out.
    Stop,
}

/// Observer notification produced by an inbound stream frame.
///
/// Built while the registry is locked and dispatched after it is released.
#[derive(Debug)]
pub struct Emission {
    observers: Arc<StreamObservers>,
    kind: EmissionKind,
}

#[derive(Debug)]
enum EmissionKind {
    Started,
    Stopped,
    Data(StreamEvent),
}

impl Emission {
    /// Notifies stream observers, then forwards data events to the
    /// connection-wide `event` observers.
    pub fn dispatch(self, connection: &ConnectionObservers) {
        match self.kind {
            EmissionKind::Started => self.observers.started.emit(&()),
            EmissionKind::Stopped => self.observers.stopped.emit(&()),
            EmissionKind::Data(event) => {
                self.observers.data.emit(&event);
                self.observers.event.emit(&event);
                connection.event.emit(&event);
            }
        }
    }
}

// ============================================================================
// StreamObservers
// ============================================================================

/// Observer lists owned by one stream.
#[derive(Debug, Default)]
pub struct StreamObservers {
    /// Remote acknowledged start.
    pub started: Subscribers<()>,
    /// Remote acknowledged stop.
    pub stopped: Subscribers<()>,
    /// Type-filtered data registrations.
    pub data: Subscribers<StreamEvent>,
    /// Every data frame of this stream.
    pub event: Subscribers<StreamEvent>,
}

impl StreamObservers {
    /// Registers a callback for data frames of one type only.
    pub fn on_type(
        &self,
        event_type: impl Into<String>,
        callback: impl Fn(Option<&Value>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let event_type = event_type.into();
        self.data.subscribe(move |event: &StreamEvent| {
            if event.event_type == event_type {
                callback(event.data.as_ref());
            }
        })
    }

    /// Removes `id` from whichever list holds it.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.started.unsubscribe(id)
            || self.stopped.unsubscribe(id)
            || self.data.unsubscribe(id)
            || self.event.unsubscribe(id)
    }
}

// ============================================================================
// Stream
// ============================================================================

/// One multiplexed sub-channel.
#[derive(Debug)]
pub struct Stream {
    kind: StreamKind,
    desired_running: bool,
    actual_running: bool,
    start_payload: Option<Value>,
    observers: Arc<StreamObservers>,
}

impl Stream {
    /// Creates a stopped, undesired stream.
    #[must_use]
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            desired_running: false,
            actual_running: false,
            start_payload: None,
            observers: Arc::new(StreamObservers::default()),
        }
    }

    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Returns `true` once the remote acknowledged a start.
    #[inline]
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.actual_running
    }

    /// Returns `true` while the caller wants the stream running.
    #[inline]
    #[must_use]
    pub const fn is_desired(&self) -> bool {
        self.desired_running
    }

    /// Returns the payload resent with every `start` frame.
    #[inline]
    #[must_use]
    pub fn start_payload(&self) -> Option<&Value> {
        self.start_payload.as_ref()
    }

    /// Returns the stream's observer lists.
    #[inline]
    #[must_use]
    pub fn observers(&self) -> &Arc<StreamObservers> {
        &self.observers
    }

    /// Marks the stream desired and reconciles.
    ///
    /// `None` keeps the previously stored payload.
    pub fn start(&mut self, payload: Option<Value>, sink: &impl FrameSink) -> Option<Action> {
        if payload.is_some() {
            self.start_payload = payload;
        }
        self.desired_running = true;
        self.reconcile(sink)
    }

    /// Marks the stream undesired and reconciles.
    ///
    /// The caller removes the stream from its registry afterwards.
    pub fn stop(&mut self, sink: &impl FrameSink) -> Option<Action> {
        self.desired_running = false;
        self.reconcile(sink)
    }

    /// Sends whatever frame moves the remote towards the desired state.
    pub fn reconcile(&mut self, sink: &impl FrameSink) -> Option<Action> {
        if !sink.is_ready() {
            return None;
        }

        let (action, frame_type, data) = match (self.actual_running, self.desired_running) {
            (false, true) => (Action::Start, START, self.start_payload.clone()),
            (true, false) => (Action::Stop, STOP, Some(Value::Null)),
            _ => return None,
        };

        match sink.send_frame(self.name(), frame_type, data) {
            Ok(()) => {
                debug!(stream = self.name(), ?action, "Stream frame sent");
                Some(action)
            }
            Err(e) => {
                trace!(stream = self.name(), error = %e, "Stream frame not sent");
                None
            }
        }
    }

    /// Forgets the remote state after the connection or remote session dropped.
    #[inline]
    pub fn reset(&mut self) {
        self.actual_running = false;
    }

    /// Applies an inbound frame and returns the notification to dispatch.
    pub fn handle(&mut self, signal: StreamSignal) -> Emission {
        let kind = match signal {
            StreamSignal::Started => {
                self.actual_running = true;
                EmissionKind::Started
            }
            StreamSignal::Stopped => {
                self.actual_running = false;
                EmissionKind::Stopped
            }
            StreamSignal::Data { event_type, data } => {
                EmissionKind::Data(StreamEvent::new(self.name(), event_type, data))
            }
        };

        Emission {
            observers: Arc::clone(&self.observers),
            kind,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::{Cell, RefCell};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::connection::ConnectionState;
    use crate::error::Error;

    #[derive(Default)]
    struct Recorder {
        ready: Cell<bool>,
        sent: RefCell<Vec<(String, String, Option<Value>)>>,
    }

    impl Recorder {
        fn ready() -> Self {
            let recorder = Self::default();
            recorder.ready.set(true);
            recorder
        }

        fn types(&self) -> Vec<String> {
            self.sent.borrow().iter().map(|(_, t, _)| t.clone()).collect()
        }
    }

    impl FrameSink for Recorder {
        fn is_ready(&self) -> bool {
            self.ready.get()
        }

        fn send_frame(&self, stream: &str, frame_type: &str, data: Option<Value>) -> Result<()> {
            if !self.ready.get() {
                return Err(Error::not_ready(ConnectionState::Connected, false));
            }
            self.sent
                .borrow_mut()
                .push((stream.to_string(), frame_type.to_string(), data));
            Ok(())
        }
    }

    #[test]
    fn test_start_sends_once_ready() {
        let sink = Recorder::default();
        let mut stream = Stream::new(StreamKind::Console);

        assert_eq!(stream.start(None, &sink), None);
        assert!(sink.sent.borrow().is_empty());

        sink.ready.set(true);
        assert_eq!(stream.reconcile(&sink), Some(Action::Start));
        assert_eq!(
            sink.sent.borrow()[0],
            ("console".to_string(), "start".to_string(), None)
        );
    }

    #[test]
    fn test_unacknowledged_start_is_resent() {
        let sink = Recorder::ready();
        let mut stream = Stream::new(StreamKind::Console);

        stream.start(None, &sink);
        stream.reconcile(&sink);
        stream.reconcile(&sink);
        assert_eq!(sink.types(), ["start", "start", "start"]);
    }

    #[test]
    fn test_start_on_started_stream_sends_nothing() {
        let sink = Recorder::ready();
        let mut stream = Stream::new(StreamKind::Console);

        stream.start(None, &sink);
        stream.handle(StreamSignal::Started);
        assert!(stream.is_started());

        assert_eq!(stream.start(None, &sink), None);
        assert_eq!(stream.reconcile(&sink), None);
        assert_eq!(sink.types(), ["start"]);
    }

    #[test]
    fn test_stop_on_stopped_stream_sends_nothing() {
        let sink = Recorder::ready();
        let mut stream = Stream::new(StreamKind::Heap);

        assert_eq!(stream.stop(&sink), None);
        assert!(sink.sent.borrow().is_empty());
    }

    #[test]
    fn test_stop_on_started_stream_sends_stop() {
        let sink = Recorder::ready();
        let mut stream = Stream::new(StreamKind::Tick);

        stream.start(None, &sink);
        stream.handle(StreamSignal::Started);
        assert_eq!(stream.stop(&sink), Some(Action::Stop));
        assert_eq!(sink.types(), ["start", "stop"]);
        assert_eq!(sink.sent.borrow()[1].2, Some(Value::Null));
    }

    #[test]
    fn test_payload_is_kept_and_resent() {
        let sink = Recorder::ready();
        let mut stream = Stream::new(StreamKind::Queue);

        stream.start(Some(json!({ "since": 10 })), &sink);
        stream.start(None, &sink);

        assert_eq!(stream.start_payload(), Some(&json!({ "since": 10 })));
        for (_, _, data) in sink.sent.borrow().iter() {
            assert_eq!(data.as_ref(), Some(&json!({ "since": 10 })));
        }
    }

    #[test]
    fn test_reset_forces_restart() {
        let sink = Recorder::ready();
        let mut stream = Stream::new(StreamKind::Console);

        stream.start(None, &sink);
        stream.handle(StreamSignal::Started);
        stream.reset();

        assert!(!stream.is_started());
        assert_eq!(stream.reconcile(&sink), Some(Action::Start));
    }

    #[test]
    fn test_data_emission_reaches_narrow_and_broad_observers() {
        let mut stream = Stream::new(StreamKind::Console);
        let connection = ConnectionObservers::default();

        let narrow = Arc::new(AtomicUsize::new(0));
        let broad = Arc::new(AtomicUsize::new(0));
        let global = Arc::new(AtomicUsize::new(0));

        let n = Arc::clone(&narrow);
        stream.observers().on_type("line", move |data| {
            assert_eq!(data, Some(&json!("Done!")));
            n.fetch_add(1, Ordering::SeqCst);
        });
        let b = Arc::clone(&broad);
        stream.observers().event.subscribe(move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        });
        let g = Arc::clone(&global);
        connection.event.subscribe(move |event| {
            assert_eq!(event.stream, "console");
            g.fetch_add(1, Ordering::SeqCst);
        });

        stream
            .handle(StreamSignal::Data {
                event_type: "line".into(),
                data: Some(json!("Done!")),
            })
            .dispatch(&connection);
        stream
            .handle(StreamSignal::Data {
                event_type: "command".into(),
                data: None,
            })
            .dispatch(&connection);

        assert_eq!(narrow.load(Ordering::SeqCst), 1);
        assert_eq!(broad.load(Ordering::SeqCst), 2);
        assert_eq!(global.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_started_and_stopped_emissions() {
        let mut stream = Stream::new(StreamKind::Console);
        let connection = ConnectionObservers::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        stream.observers().started.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let h = Arc::clone(&hits);
        stream.observers().stopped.subscribe(move |_| {
            h.fetch_add(10, Ordering::SeqCst);
        });

        stream.handle(StreamSignal::Started).dispatch(&connection);
        assert!(stream.is_started());
        stream.handle(StreamSignal::Stopped).dispatch(&connection);
        assert!(!stream.is_started());
        assert_eq!(hits.load(Ordering::SeqCst), 11);
    }
}
