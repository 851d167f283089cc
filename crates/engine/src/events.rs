//! Lifecycle events published to registered [`EngineObserver`]s.
//!
//! Grounded on `Nick-Mazuk-enso`'s `ChangeRecord`/`ChangeNotification` shape
//! (an enum-plus-payload record of what changed, broadcast to subscribers) —
//! generalized from a triple-store's change log to this engine's command
//! surface. Unlike `ChangeNotification`, there is no broadcast channel here:
//! observers are called synchronously, in-process, from within the command
//! method that produced the event (see `engine`'s crate-level docs on the
//! concurrency model).

use crate::errors::ErrorCode;
use crate::stats::CompactionStats;

/// A single lifecycle event, published after its corresponding mutation (or
/// read, or error) has already taken effect.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was written via `SET`.
    Set {
        /// The key written.
        key: String,
        /// The value written.
        value: Vec<u8>,
        /// The TTL supplied, if any.
        ttl_ms: Option<u64>,
    },
    /// A key was looked up via `GET`.
    Get {
        /// The key looked up.
        key: String,
        /// Whether the lookup found a live value.
        hit: bool,
    },
    /// A key was deleted via `DEL`.
    Del {
        /// The key deleted.
        key: String,
        /// Whether a live entry existed before the delete.
        deleted: bool,
    },
    /// A key's expiry was updated via `EXPIRE`.
    Expire {
        /// The key whose expiry was updated.
        key: String,
        /// The TTL applied.
        ttl_ms: u64,
    },
    /// The memtable was flushed to a new L0 run.
    Flush {
        /// The number of L0 runs after the flush.
        runs_after_l0: usize,
    },
    /// A compaction step began at the given level.
    CompactionStart {
        /// The level being compacted.
        level: u8,
    },
    /// A compaction step completed.
    CompactionEnd {
        /// The level that was compacted into.
        level: u8,
        /// Statistics for the completed step.
        stats: CompactionStats,
    },
    /// An error occurred while processing a command.
    Error {
        /// The error's stable code.
        code: ErrorCode,
        /// A human-readable description.
        message: String,
    },
}

/// Receives [`Event`]s published by the engine.
///
/// Callbacks receive owned, cloned payloads rather than a reference into
/// engine state, so an observer can never hold a reference into mutable
/// engine state (see the engine crate's concurrency model docs).
pub trait EngineObserver: Send + Sync {
    /// Called synchronously when an event occurs.
    fn on_event(&self, event: &Event);
}
