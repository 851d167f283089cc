//! # Engine — in-memory LSM-tree storage engine
//!
//! The central orchestrator that ties together the [`memtable`], [`wal`], and
//! [`run`] crates into a complete, in-process LSM-tree key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                       │
//! │                                                │
//! │ write.rs → WAL append → Memtable insert        │
//! │              |                                 │
//! │              |  (threshold exceeded?)          │
//! │              |            yes                  │
//! │              v                                 │
//! │           flush() → new L0 run                 │
//! │              |                                 │
//! │              |  (L0 count > K_0?)              │
//! │              |            yes                  │
//! │              v                                 │
//! │           compact_step(0) → merged L1 run       │
//! │                                                │
//! │ read.rs → Memtable → L0 runs → L1..L_MAX runs  │
//! │            (first match wins)                  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module        | Purpose                                               |
//! |--------------|---------------------------------------------------------|
//! | [`lib.rs`]   | `Engine` struct, constructor, accessors, `Debug`         |
//! | [`write`]    | `set`, `del`, `expire`, `incr`/`decr`, `mset`, `flush`   |
//! | [`read`]     | `get`, `exists`, `ttl`, `keys`, `mget`                   |
//! | [`compaction`] | size-tiered L0 / leveled L1+ compaction policy         |
//! | [`command`]  | `Command`/`CommandResult`, `Engine::execute` dispatch    |
//! | [`events`]   | `Event`, `EngineObserver`                                |
//! | [`errors`]   | `EngineError`, `ErrorCode`                               |
//! | [`stats`]    | `EngineStats` and friends, returned by `INFO`            |
//!
//! ## Levels
//!
//! ```text
//! ┌────────────────────────────┐  ← freshest, checked first
//! │ MEMTABLE                   │
//! ├────────────────────────────┤  ← from flushes (may overlap)
//! │ L0 runs                    │
//! ├────────────────────────────┤  ← from compaction (no overlap)
//! │ L1..L_MAX runs             │
//! └────────────────────────────┘
//! ```
//!
//! ## Durability
//!
//! Every write is appended to the WAL **before** the memtable update. The
//! WAL is cleared only after a successful flush to a new run. There is no
//! disk behind any of this: the engine's durability story stops at
//! "survive within the current process". A host wanting durable crash
//! recovery is expected to build that on top, using `WalLog::replay` to
//! seed a fresh engine (see the `wal` crate).

mod command;
mod compaction;
mod errors;
mod events;
mod read;
mod stats;
mod write;

pub use command::{Command, CommandResult};
pub use errors::{EngineError, ErrorCode};
pub use events::{Event, EngineObserver};
pub use run::Run;
pub use stats::{CompactionStats, EngineStats, MemtableStats, RunStats};

use std::sync::Arc;

use clock::{Clock, SystemClock};
use config::EngineConfig;
use memtable::Memtable;
use wal::WalLog;

/// Number of runs at L0 that triggers compaction into L1.
pub const L0_COMPACTION_TRIGGER: usize = 4;

/// Deepest level a run can occupy. Levels run `0..=L_MAX`.
pub const L_MAX: u8 = 6;

/// Returns the run-count threshold for level `level` (`level > 0`):
/// `10^level`.
#[must_use]
pub fn level_threshold(level: u8) -> usize {
    10usize.saturating_pow(u32::from(level))
}

/// The central storage engine orchestrating the memtable, WAL, and runs.
///
/// # Write path
///
/// 1. Validate arguments; a validation failure never mutates state.
/// 2. Append the operation to the WAL.
/// 3. Apply the mutation to the memtable.
/// 4. If the memtable's `size_bytes` crosses the configured threshold,
///    flush it to a new L0 run and clear the WAL.
///
/// # Read path
///
/// 1. Check the memtable (freshest data, includes tombstones).
/// 2. Check L0 runs, newest to oldest (may overlap).
/// 3. Check each deeper level, newest to oldest (non-overlapping by
///    construction).
/// 4. First match wins; tombstones and expired entries both read as absent.
pub struct Engine {
    pub(crate) mem: Memtable,
    /// `levels[L]` holds the runs at level `L`, ordered newest-first.
    /// Always has `L_MAX as usize + 1` slots.
    pub(crate) levels: Vec<Vec<Run>>,
    pub(crate) wal: WalLog,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: EngineConfig,
    pub(crate) next_run_id: u64,
    pub(crate) compaction_in_progress: bool,
    pub(crate) compaction_history: Vec<CompactionStats>,
    pub(crate) observers: Vec<Box<dyn EngineObserver>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("memtable_size_bytes", &self.mem.size_bytes())
            .field("memtable_entries", &self.mem.entry_count())
            .field(
                "run_counts_by_level",
                &self.levels.iter().map(Vec::len).collect::<Vec<_>>(),
            )
            .field("compaction_in_progress", &self.compaction_in_progress)
            .field("config", &self.config)
            .finish()
    }
}

impl Engine {
    /// Creates a new, empty engine with the default clock ([`SystemClock`]).
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a new, empty engine with an explicit clock, for deterministic
    /// testing (see `clock::ManualClock`).
    #[must_use]
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let levels = (0..=L_MAX).map(|_| Vec::new()).collect();
        Self {
            mem: Memtable::new(),
            levels,
            wal: WalLog::new(),
            clock,
            config,
            next_run_id: 0,
            compaction_in_progress: false,
            compaction_history: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Registers an observer to receive future [`Event`]s.
    pub fn add_observer(&mut self, observer: Box<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    /// Publishes `event` to every registered observer.
    pub(crate) fn publish(&self, event: Event) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    /// Returns the engine's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the total number of runs across all levels.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Returns the number of L0 runs.
    #[must_use]
    pub fn l0_run_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Scans up to `sample_size` memtable keys and evicts any that have
    /// expired.
    ///
    /// Driven periodically by the host; a call with `sample_size` larger
    /// than the memtable's current key count simply sweeps every key.
    /// Candidates are drawn from [`Memtable::all_keys`] rather than
    /// [`Memtable::keys`], which already hides expired entries. Sampling
    /// from `keys()` would mean this sweep could never find anything to
    /// evict.
    pub fn sweep_expired_sample(&mut self, sample_size: usize) {
        use rand::seq::SliceRandom;

        let mut candidates = self.mem.all_keys();
        candidates.shuffle(&mut rand::rng());
        candidates.truncate(sample_size);

        for key in candidates {
            self.mem.evict_if_expired(&key, self.clock.as_ref());
        }
    }

    /// Clears the memtable, every run, the WAL, and the compaction history.
    pub fn flush_all(&mut self) {
        self.mem.clear();
        for level in &mut self.levels {
            level.clear();
        }
        self.wal.clear();
        self.compaction_history.clear();
    }

    pub(crate) fn validate_key(key: &str) -> Result<(), EngineError> {
        if key.is_empty() {
            Err(EngineError::Validation("key must not be empty".to_string()))
        } else {
            Ok(())
        }
    }

    pub(crate) fn validate_ttl(ttl_ms: u64) -> Result<(), EngineError> {
        if ttl_ms == 0 {
            Err(EngineError::Validation(
                "ttl_ms must be positive".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    pub(crate) fn next_run_id(&mut self) -> u64 {
        let id = self.next_run_id;
        self.next_run_id += 1;
        id
    }
}

#[cfg(test)]
mod tests;
