//! Typed observer registrations.
//!
//! Each event category owns one [`Subscribers`] list. Emission snapshots the
//! list first and runs callbacks without holding the lock, so a callback may
//! freely call back into the connection (send, subscribe, disconnect).
//!
//! # Example
//!
//! ```ignore
//! let id = connection.on_ready(|| println!("ready"));
//! connection.unsubscribe(id);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Error;
use crate::identifiers::SubscriptionId;
use crate::protocol::StreamEvent;
use crate::status::ServerStatus;

// ============================================================================
// Types
// ============================================================================

/// Observer callback type.
///
/// Called with a reference to the emitted value.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

// ============================================================================
// Subscribers
// ============================================================================

/// Registered callbacks for one event category.
pub struct Subscribers<T: ?Sized> {
    entries: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T: ?Sized> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.len())
            .finish()
    }
}

impl<T: ?Sized> Subscribers<T> {
    /// Creates an empty list.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.entries.lock().push((id, Arc::new(callback)));
        id
    }

    /// Removes a callback. Returns `true` if it was registered here.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    /// Invokes every registered callback with `value`.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in snapshot {
            callback(value);
        }
    }

    /// Returns the number of registered callbacks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// ConnectionObservers
// ============================================================================

/// All connection-level event categories.
#[derive(Debug, Default)]
pub struct ConnectionObservers {
    /// Socket opened.
    pub open: Subscribers<()>,
    /// Remote signalled readiness.
    pub ready: Subscribers<()>,
    /// Socket closed (or an attempt failed).
    pub close: Subscribers<()>,
    /// Socket-level error.
    pub error: Subscribers<Error>,
    /// Remote session attached.
    pub connected: Subscribers<()>,
    /// Remote session dropped.
    pub disconnected: Subscribers<()>,
    /// Server status snapshot.
    pub status: Subscribers<ServerStatus>,
    /// Generic stream event from any stream.
    pub event: Subscribers<StreamEvent>,
}

impl ConnectionObservers {
    /// Removes `id` from whichever category holds it.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.open.unsubscribe(id)
            || self.ready.unsubscribe(id)
            || self.close.unsubscribe(id)
            || self.error.unsubscribe(id)
            || self.connected.unsubscribe(id)
            || self.disconnected.unsubscribe(id)
            || self.status.unsubscribe(id)
            || self.event.unsubscribe(id)
    }
}

// ============================================================================
// Tests
// ============================================================================
