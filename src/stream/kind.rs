//! Known stream kinds.
//!
//! The remote only multiplexes a fixed set of channels, so names resolve to
//! a closed enum instead of instantiating anything on demand.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// ============================================================================
// StreamKind
// ============================================================================

/// A stream the remote knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamKind {
    /// Server console output and commands.
    Console,
    /// JVM heap usage samples.
    Heap,
    /// Server tick timings.
    Tick,
    /// Start queue position updates.
    Queue,
}

impl StreamKind {
    /// Every known kind.
    pub const ALL: [Self; 4] = [Self::Console, Self::Heap, Self::Tick, Self::Queue];

    /// Wire name of the stream.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Heap => "heap",
            Self::Tick => "tick",
            Self::Queue => "queue",
        }
    }

    /// Resolves a wire name, or `None` if the remote has no such stream.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_name(name).ok_or_else(|| Error::unknown_stream(name))
    }
}

// ============================================================================
// Tests
// ============================================================================
