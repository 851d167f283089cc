//! # Engine configuration
//!
//! `EngineConfig` aggregates the knobs the storage engine reads at
//! construction time. Grounded on `boxkv-common::config`'s pattern of a
//! `serde`-deserializable, `#[serde(default)]`-annotated struct per
//! subsystem — generalized here to a single struct since the engine has
//! only one subsystem worth configuring (no separate server/storage split,
//! since networking is host territory, out of scope for this crate).
//!
//! Unlike `boxkv-common::config`, there is no global singleton or
//! file/environment loader here: the engine has no filesystem or process
//! environment of its own to read from, so a caller constructs an
//! `EngineConfig` directly (typically via [`EngineConfig::default`]) and
//! passes it to `Engine::new`.

use serde::Deserialize;

/// Configuration recognized by the storage engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Flush threshold, in megabytes, at which the memtable is frozen into
    /// a new L0 run.
    pub max_memtable_size_mb: u64,
    /// Period, in milliseconds, between periodic compaction ticks the host
    /// is expected to drive.
    pub compaction_interval_ms: u64,
    /// Whether runs build a bloom filter over their keys.
    pub enable_bloom_filter: bool,
    /// The log level the host should configure its subscriber with. Stored
    /// so the host can read it back; never interpreted by the engine.
    pub log_level: LogLevel,
}

impl EngineConfig {
    /// Returns the flush threshold in bytes.
    #[must_use]
    pub fn max_memtable_size_bytes(&self) -> usize {
        (self.max_memtable_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_memtable_size_mb: 64,
            compaction_interval_ms: 60_000,
            enable_bloom_filter: true,
            log_level: LogLevel::Info,
        }
    }
}

/// A log verbosity level, mirroring `tracing`'s levels without requiring
/// this crate to depend on `tracing` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose diagnostic output.
    Debug,
    /// Routine operational messages.
    Info,
    /// Recoverable but noteworthy conditions.
    Warn,
    /// Failures.
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}
