//! Registry of active streams.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tracing::debug;

use super::state::{FrameSink, Stream};
use super::StreamKind;

// ============================================================================
// StreamRegistry
// ============================================================================

/// Owns the streams currently in use, at most one per [`StreamKind`].
///
/// Streams are created on first reference and dropped on `stop()` or when
/// the connection is torn down; nothing survives a `clear()`.
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: FxHashMap<StreamKind, Stream>,
}

impl StreamRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stream for `kind`, creating it if needed.
    pub fn get_or_create(&mut self, kind: StreamKind) -> &mut Stream {
        self.streams.entry(kind).or_insert_with(|| {
            debug!(stream = kind.as_str(), "Stream registered");
            Stream::new(kind)
        })
    }

    /// Returns a registered stream.
    #[inline]
    #[must_use]
    pub fn get(&self, kind: StreamKind) -> Option<&Stream> {
        self.streams.get(&kind)
    }

    /// Returns a registered stream mutably.
    #[inline]
    pub fn get_mut(&mut self, kind: StreamKind) -> Option<&mut Stream> {
        self.streams.get_mut(&kind)
    }

    /// Returns the registered stream named `name`, without creating it.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Stream> {
        StreamKind::from_name(name).and_then(|kind| self.streams.get_mut(&kind))
    }

    /// Discards a stream.
    pub fn remove(&mut self, kind: StreamKind) -> Option<Stream> {
        let removed = self.streams.remove(&kind);
        if removed.is_some() {
            debug!(stream = kind.as_str(), "Stream removed");
        }
        removed
    }

    /// Discards every stream.
    pub fn clear(&mut self) {
        self.streams.clear();
    }

    /// Returns the registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<StreamKind> {
        let mut kinds: Vec<_> = self.streams.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Returns the number of registered streams.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Returns `true` if no stream is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Marks every stream stopped on the remote side.
    pub fn reset_all(&mut self) {
        for stream in self.streams.values_mut() {
            stream.reset();
        }
    }

    /// Reconciles every stream. Returns how many frames went out.
    pub fn reconcile_all(&mut self, sink: &impl FrameSink) -> usize {
        self.streams
            .values_mut()
            .filter_map(|stream| stream.reconcile(sink))
            .count()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use serde_json::Value;

    use crate::error::Result;
    use crate::protocol::StreamSignal;

    struct CountingSink {
        sent: Cell<usize>,
    }

    impl FrameSink for CountingSink {
        fn is_ready(&self) -> bool {
            true
        }

        fn send_frame(&self, _: &str, _: &str, _: Option<Value>) -> Result<()> {
            self.sent.set(self.sent.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_find_does_not_create() {
        let mut registry = StreamRegistry::new();
        assert!(registry.find_mut("console").is_none());
        registry.get_or_create(StreamKind::Console);
        assert!(registry.find_mut("console").is_some());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut registry = StreamRegistry::new();
        registry.get_or_create(StreamKind::Console);
        registry.get_or_create(StreamKind::Queue);
        assert_eq!(registry.kinds(), [StreamKind::Console, StreamKind::Queue]);

        assert!(registry.remove(StreamKind::Console).is_some());
        assert!(registry.remove(StreamKind::Console).is_none());
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reconcile_all_skips_satisfied_streams() {
        let sink = CountingSink { sent: Cell::new(0) };
        let mut registry = StreamRegistry::new();

        registry.get_or_create(StreamKind::Console).start(None, &sink);
        registry.get_or_create(StreamKind::Heap).start(None, &sink);
        registry.get_or_create(StreamKind::Tick);
        registry
            .get_mut(StreamKind::Heap)
            .unwrap()
            .handle(StreamSignal::Started);

        sink.sent.set(0);
        assert_eq!(registry.reconcile_all(&sink), 1);
    }

    #[test]
    fn test_reset_all() {
        let mut registry = StreamRegistry::new();
        registry
            .get_or_create(StreamKind::Console)
            .handle(StreamSignal::Started);
        registry.reset_all();
        assert!(!registry.get(StreamKind::Console).unwrap().is_started());
    }
}
