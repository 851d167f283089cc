//! `INFO` statistics shapes, returned by `Engine::info`.

/// Snapshot of the memtable's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemtableStats {
    /// Approximate byte size of the memtable's entries.
    pub size_bytes: usize,
    /// Number of entries (including tombstones).
    pub entry_count: usize,
    /// The oldest `created_at` among current entries, if any.
    pub oldest_created_at: Option<i64>,
    /// The newest `created_at` among current entries, if any.
    pub newest_created_at: Option<i64>,
}

/// Snapshot of a single run's metadata, independent of `run::RunMetadata` so
/// the engine's public API doesn't leak the `run` crate's types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// The run's identifier.
    pub id: u64,
    /// The level this run lives at.
    pub level: u8,
    /// The smallest key in the run.
    pub min_key: String,
    /// The largest key in the run.
    pub max_key: String,
    /// Approximate byte size of the run's entries.
    pub size_bytes: usize,
    /// Number of entries (including tombstones).
    pub entry_count: usize,
    /// Millisecond timestamp at which the run was created.
    pub created_at: i64,
}

/// Record of a single compaction step, appended to `Engine::compaction_history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionStats {
    /// The level the step compacted into.
    pub level: u8,
    /// Number of input runs consumed.
    pub input_files: usize,
    /// Number of output runs produced (always 1 in this engine).
    pub output_files: usize,
    /// Total byte size of the input runs.
    pub input_bytes: usize,
    /// Total byte size of the output run.
    pub output_bytes: usize,
    /// Wall-clock duration of the step, per the injected clock.
    pub duration_ms: u64,
    /// Total entries read from the input runs.
    pub entries_in: usize,
    /// Entries dropped during the step (expired entries, or tombstones GC'd
    /// at the bottom level).
    pub entries_dropped: usize,
}

/// The full `INFO` snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStats {
    /// Current memtable state.
    pub memtable: MemtableStats,
    /// Metadata for every run currently held, across all levels.
    pub runs: Vec<RunStats>,
    /// `memtable.size_bytes` plus the sum of all runs' `size_bytes`.
    pub total_size_bytes: usize,
    /// Deduplicated live key count across the memtable and all runs.
    pub total_entries: usize,
    /// History of compaction steps run so far this session.
    pub compaction_history: Vec<CompactionStats>,
}
