//! Inbound frame routing.
//!
//! Every text frame from the current socket passes through [`dispatch`]:
//!
//! | Frame type | Effect |
//! |------------|--------|
//! | `keep-alive` | none |
//! | `ready` | mark ready, reconcile streams, emit `ready` |
//! | `connected` | emit `connected` |
//! | `disconnected` | reset streams, emit `disconnected`, retry streams later |
//! | `status` | apply to the status model, emit `status`, reconcile streams |
//! | with `stream` | deliver to that stream |
//! | anything else | log |
//!
//! Malformed frames are logged and dropped; routing never fails.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::protocol::{InboundMessage, Route, StreamSignal};

use super::manager::ConnectionInner;

// ============================================================================
// Dispatch
// ============================================================================

/// Parses and routes one inbound text frame.
pub(super) fn dispatch(inner: &ConnectionInner, text: &str) {
    let route = match InboundMessage::from_text(text).and_then(InboundMessage::route) {
        Ok(route) => route,
        Err(e) => {
            warn!(error = %e, frame = text, "Dropping malformed frame");
            return;
        }
    };

    match route {
        Route::KeepAlive => trace!("Keep-alive"),
        Route::Ready => handle_ready(inner),
        Route::Connected => {
            debug!("Remote session connected");
            inner.observers.connected.emit(&());
        }
        Route::Disconnected => handle_disconnected(inner),
        Route::Status(raw) => handle_status(inner, &raw),
        Route::Stream { stream, signal } => handle_stream(inner, &stream, signal),
        Route::Unhandled(message) => {
            warn!(message_type = %message.message_type, "Unhandled message");
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn handle_ready(inner: &ConnectionInner) {
    if !inner.mark_ready() {
        debug!("Ready frame without open socket, ignoring");
        return;
    }

    info!("Remote ready");
    inner.reconcile_streams();
    inner.observers.ready.emit(&());
}

fn handle_disconnected(inner: &ConnectionInner) {
    inner.registry.lock().reset_all();
    info!("Remote session disconnected");
    inner.observers.disconnected.emit(&());

    if inner.options.auto_reconnect {
        inner.schedule_stream_retry();
    }
}

fn handle_status(inner: &ConnectionInner, raw: &Value) {
    let result = inner.status_model.lock().apply_status_update(raw);

    match result {
        Ok(status) => {
            debug!(class = ?status.class, "Status update");
            *inner.latest_status.lock() = Some(status.clone());
            inner.observers.status.emit(&status);
            inner.reconcile_streams();
        }
        Err(e) => warn!(error = %e, "Status update rejected"),
    }
}

fn handle_stream(inner: &ConnectionInner, stream: &str, signal: StreamSignal) {
    let emission = inner
        .registry
        .lock()
        .find_mut(stream)
        .map(|target| target.handle(signal));

    match emission {
        Some(emission) => emission.dispatch(&inner.observers),
        None => warn!(stream, "Unhandled message for unregistered stream"),
    }
}

// ============================================================================
// Tests
// ============================================================================
