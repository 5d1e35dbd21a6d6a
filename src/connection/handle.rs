//! Per-stream handle.
//!
//! A [`StreamHandle`] names one stream on one connection. It never holds a
//! reference into the registry: every call resolves the stream again, so a
//! handle stays valid across `stop()` and `disconnect()`, and the next
//! `start()` or observer registration re-creates the stream.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::identifiers::SubscriptionId;
use crate::protocol::StreamEvent;
use crate::stream::{StreamKind, StreamObservers};

use super::manager::ConnectionInner;

// ============================================================================
// StreamHandle
// ============================================================================

/// Handle to one multiplexed stream.
///
/// Obtained from [`Connection::stream`](super::Connection::stream).
#[derive(Clone)]
pub struct StreamHandle {
    kind: StreamKind,
    inner: Arc<ConnectionInner>,
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("kind", &self.kind)
            .field("registered", &self.is_registered())
            .field("started", &self.is_started())
            .finish()
    }
}

impl StreamHandle {
    pub(super) fn new(kind: StreamKind, inner: Arc<ConnectionInner>) -> Self {
        Self { kind, inner }
    }

    /// Returns the stream kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Returns the stream name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Returns `true` once the remote confirmed the stream is running.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.inner
            .registry
            .lock()
            .get(self.kind)
            .is_some_and(|stream| stream.is_started())
    }

    /// Returns `true` while the stream is in the registry.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.inner.registry.lock().get(self.kind).is_some()
    }

    /// Returns the stored start payload.
    #[must_use]
    pub fn start_payload(&self) -> Option<Value> {
        self.inner
            .registry
            .lock()
            .get(self.kind)
            .and_then(|stream| stream.start_payload().cloned())
    }
}

// ============================================================================
// StreamHandle - Control
// ============================================================================

impl StreamHandle {
    /// Wants the stream running.
    ///
    /// `payload` replaces the stored start payload; `None` keeps it. The
    /// `start` frame goes out now if the connection is ready, otherwise on
    /// the next reconciliation.
    pub fn start(&self, payload: Option<Value>) {
        let mut registry = self.inner.registry.lock();
        registry
            .get_or_create(self.kind)
            .start(payload, &*self.inner);
    }

    /// Wants the stream stopped and removes it from the registry.
    ///
    /// Observers registered on the stream are discarded with it.
    pub fn stop(&self) {
        let mut registry = self.inner.registry.lock();
        if let Some(stream) = registry.get_mut(self.kind) {
            stream.stop(&*self.inner);
            registry.remove(self.kind);
        }
    }

    /// Sends a frame on this stream.
    ///
    /// # Errors
    ///
    /// See [`Connection::send`](super::Connection::send).
    pub fn send(&self, frame_type: &str, data: Option<Value>) -> Result<()> {
        self.inner.send(self.name(), frame_type, data)
    }
}

// ============================================================================
// StreamHandle - Observers
// ============================================================================

impl StreamHandle {
    /// Called when the remote confirms the stream started.
    pub fn on_started(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.observers().started.subscribe(move |_| f())
    }

    /// Called when the remote confirms the stream stopped.
    pub fn on_stopped(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.observers().stopped.subscribe(move |_| f())
    }

    /// Called with the payload of every data frame of `event_type`.
    pub fn on_data(
        &self,
        event_type: impl Into<String>,
        f: impl Fn(Option<&Value>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers().on_type(event_type, f)
    }

    /// Called with every data frame of this stream.
    pub fn on_event(&self, f: impl Fn(&StreamEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.observers().event.subscribe(f)
    }

    /// Removes a registration made through this handle.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let observers = self
            .inner
            .registry
            .lock()
            .get(self.kind)
            .map(|stream| Arc::clone(stream.observers()));
        observers.is_some_and(|observers| observers.unsubscribe(id))
    }

    fn observers(&self) -> Arc<StreamObservers> {
        let mut registry = self.inner.registry.lock();
        Arc::clone(registry.get_or_create(self.kind).observers())
    }
}

// ============================================================================
// Tests
// ============================================================================
