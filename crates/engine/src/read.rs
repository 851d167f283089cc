//! Read path: `get`, `exists`, `ttl`, `keys`, `mget`.
//!
//! Point lookups check the memtable first (freshest data), then L0 runs
//! (newest-first, may overlap), then each deeper level's runs (newest-first,
//! non-overlapping). The first match wins; tombstones and expired entries
//! both read as absent.

use std::collections::BTreeSet;

use memtable::{Value, VersionedEntry};
use pattern::Pattern;

use crate::errors::EngineError;
use crate::events::Event;
use crate::stats::{EngineStats, MemtableStats, RunStats};
use crate::Engine;

/// The outcome of resolving a key across the memtable and every run.
struct Resolved {
    /// `Some(bytes)` for a live value, `None` for a tombstone or absence.
    value: Option<Vec<u8>>,
    /// The resolved entry's expiry, if any. Only meaningful when `value` is
    /// `Some` or the key was a (non-expired) tombstone.
    expires_at: Option<i64>,
}

/// Interprets the newest entry found for a key: an expired entry (even a
/// live, non-tombstone one) is functionally a tombstone for shadowing
/// purposes, so it resolves to absent rather than letting the search fall
/// through to an older, still-live copy in a deeper source.
fn resolved_from_entry(entry: &VersionedEntry, now_ms: i64) -> Resolved {
    if matches!(entry.expires_at, Some(at) if at <= now_ms) {
        return Resolved {
            value: None,
            expires_at: None,
        };
    }
    match &entry.value {
        Value::Present(bytes) => Resolved {
            value: Some(bytes.clone()),
            expires_at: entry.expires_at,
        },
        Value::Tombstone => Resolved {
            value: None,
            expires_at: None,
        },
    }
}

impl Engine {
    /// Looks up `key` (the `GET` command). Expired and tombstoned entries
    /// both return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if `key` is empty.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError> {
        Self::validate_key(key)?;
        let resolved = self.resolve(key);
        self.publish(Event::Get {
            key: key.to_string(),
            hit: resolved.value.is_some(),
        });
        Ok(resolved.value)
    }

    /// Returns `true` iff [`Engine::get`] would return a value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if `key` is empty.
    pub fn exists(&self, key: &str) -> Result<bool, EngineError> {
        Self::validate_key(key)?;
        Ok(self.resolve(key).value.is_some())
    }

    /// Returns the remaining TTL in whole seconds (rounded up), `-1` if
    /// present without an expiry, or `-2` if absent (including tombstoned
    /// or expired).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if `key` is empty.
    pub fn ttl(&self, key: &str) -> Result<i64, EngineError> {
        Self::validate_key(key)?;
        let now = self.clock.now_ms();
        let resolved = self.resolve(key);
        let ttl = match (&resolved.value, resolved.expires_at) {
            (None, _) => -2,
            (Some(_), None) => -1,
            (Some(_), Some(at)) => {
                let remaining = at - now;
                if remaining <= 0 {
                    -2
                } else {
                    (remaining + 999) / 1000
                }
            }
        };
        Ok(ttl)
    }

    /// Returns live keys matching `pattern` (or all live keys if `None`),
    /// deduplicated across the memtable and every run.
    ///
    /// Unlike [`Engine::get`], this does not publish a `Get` event per
    /// candidate key.
    ///
    /// # Errors
    ///
    /// This method cannot fail; it returns `Result` for symmetry with the
    /// rest of the command surface and to leave room for a future
    /// fallible pattern source.
    pub fn keys(&self, pattern: Option<&str>) -> Result<Vec<String>, EngineError> {
        let compiled = Pattern::compile_opt(pattern);
        let mut candidates: BTreeSet<String> = BTreeSet::new();

        for (k, _) in self.mem.iter_sorted(self.clock.as_ref()) {
            if compiled.matches(k) {
                candidates.insert(k.clone());
            }
        }
        for level in &self.levels {
            for run in level {
                for (k, _) in run.entries_sorted() {
                    if compiled.matches(k) {
                        candidates.insert(k.clone());
                    }
                }
            }
        }

        let live = candidates
            .into_iter()
            .filter(|k| self.resolve(k).value.is_some())
            .collect();
        Ok(live)
    }

    /// Looks up each key in `keys`, preserving order (the `MGET` command).
    /// Per-element semantics match [`Engine::get`], including the `Get`
    /// event published for each element.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if any key is empty.
    pub fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, EngineError> {
        keys.iter().map(|k| self.get(k)).collect()
    }

    /// Assembles a point-in-time snapshot of the engine's state (the `INFO`
    /// command): memtable occupancy, per-run metadata across every level,
    /// aggregate totals, and the compaction history so far.
    pub fn info(&self) -> EngineStats {
        let memtable = MemtableStats {
            size_bytes: self.mem.size_bytes(),
            entry_count: self.mem.entry_count(),
            oldest_created_at: self
                .mem
                .iter_sorted(self.clock.as_ref())
                .map(|(_, e)| e.created_at)
                .min(),
            newest_created_at: self
                .mem
                .iter_sorted(self.clock.as_ref())
                .map(|(_, e)| e.created_at)
                .max(),
        };

        let runs: Vec<RunStats> = self
            .levels
            .iter()
            .flatten()
            .map(|run| {
                let m = run.metadata();
                RunStats {
                    id: m.id,
                    level: m.level,
                    min_key: m.min_key.clone(),
                    max_key: m.max_key.clone(),
                    size_bytes: m.byte_size,
                    entry_count: m.entry_count,
                    created_at: m.created_at,
                }
            })
            .collect();

        let total_size_bytes = memtable.size_bytes + runs.iter().map(|r| r.size_bytes).sum::<usize>();
        let total_entries = self.keys(None).unwrap_or_default().len();

        EngineStats {
            memtable,
            runs,
            total_size_bytes,
            total_entries,
            compaction_history: self.compaction_history.clone(),
        }
    }

    /// Resolves `key` across the memtable and every run, without publishing
    /// any event.
    ///
    /// Stops at the newest source that has *any* entry for `key`, checking
    /// the memtable first, then each run newest-first. An expired entry
    /// still stops the search and resolves to absent, the same as a
    /// tombstone, rather than letting an older, still-live copy in a deeper
    /// source shine through. An expired non-tombstone is functionally a
    /// tombstone for shadowing.
    fn resolve(&self, key: &str) -> Resolved {
        let now = self.clock.now_ms();

        if let Some(entry) = self.mem.get_raw(key) {
            return resolved_from_entry(entry, now);
        }

        for level in &self.levels {
            for run in level {
                if let Some(entry) = run.lookup_raw(key) {
                    return resolved_from_entry(entry, now);
                }
            }
        }

        Resolved {
            value: None,
            expires_at: None,
        }
    }
}
