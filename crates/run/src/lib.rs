//! # Run — immutable sorted run
//!
//! A frozen, in-memory snapshot of key-sorted entries, generalized from the
//! teacher's on-disk SSTable format.
//!
//! When the engine's memtable crosses its size threshold, its live entries
//! are copied, sorted, into a new `Run` at level 0. A run is *write-once,
//! read-many* — once created it is never modified (only replaced by
//! compaction, which produces new runs from old ones).
//!
//! There is no on-disk file layout here: this engine keeps every run
//! resident in memory for the life of the process, so the CRC framing,
//! footer versioning, and index section the teacher's SSTable format used to
//! survive a crash have no reason to exist. What's kept is the *shape*: a
//! run still carries per-run metadata and an optional bloom filter sized
//! from its entry count, and lookups still consult the bloom filter before
//! doing any real work.

mod merge;

pub use merge::MergeIterator;

use bloom::BloomFilter;
use memtable::VersionedEntry;

/// Whether a bloom filter has ruled a key in or out.
///
/// `DefinitelyNot` is authoritative: the run can be skipped without a binary
/// search. `Maybe` means the bloom filter is absent or says the key could be
/// present; the caller must still binary-search to know for sure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbabilisticHint {
    /// The key is definitely not present in this run.
    DefinitelyNot,
    /// The key might be present; a real lookup is required.
    Maybe,
}

/// Per-run metadata, independent of the entries themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    /// A monotonically increasing identifier, unique within the engine.
    pub id: u64,
    /// The level this run lives at (0..=L_MAX).
    pub level: u8,
    /// The smallest key in the run.
    pub min_key: String,
    /// The largest key in the run.
    pub max_key: String,
    /// Approximate byte size of the run's entries.
    pub byte_size: usize,
    /// Number of entries (including tombstones).
    pub entry_count: usize,
    /// Millisecond timestamp at which the run was created.
    pub created_at: i64,
}

/// An immutable, sorted, in-memory snapshot of versioned entries.
#[derive(Debug)]
pub struct Run {
    entries: Vec<(String, VersionedEntry)>,
    metadata: RunMetadata,
    bloom: Option<BloomFilter>,
}

impl Run {
    /// Builds a new run from an already key-sorted, deduplicated sequence of
    /// entries.
    ///
    /// `entries` must be sorted ascending by key with no duplicate keys
    /// (callers are the memtable flush path and the compactor, both of which
    /// already produce sorted, deduplicated input). If `with_bloom` is
    /// `true`, a bloom filter is built over the entries' keys using the
    /// fixed `m = 10 * n`, `k = 3` recipe.
    ///
    /// # Panics
    ///
    /// Panics if `entries` is empty; an empty run is never useful and
    /// indicates a logic bug in the caller (mirrors the teacher's refusal to
    /// write an empty SSTable).
    #[must_use]
    pub fn new(
        id: u64,
        level: u8,
        entries: Vec<(String, VersionedEntry)>,
        with_bloom: bool,
        created_at: i64,
    ) -> Self {
        assert!(!entries.is_empty(), "refusing to build an empty run");

        let min_key = entries.first().unwrap().0.clone();
        let max_key = entries.last().unwrap().0.clone();
        let byte_size = entries
            .iter()
            .map(|(k, e)| entry_size(k, e))
            .sum::<usize>();
        let entry_count = entries.len();

        let bloom = if with_bloom {
            let mut bf = BloomFilter::with_capacity(entry_count);
            for (key, _) in &entries {
                bf.insert(key.as_bytes());
            }
            Some(bf)
        } else {
            None
        };

        Self {
            entries,
            metadata: RunMetadata {
                id,
                level,
                min_key,
                max_key,
                byte_size,
                entry_count,
                created_at,
            },
            bloom,
        }
    }

    /// Consults the bloom filter (if built) for a cheap "definitely absent"
    /// answer.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> ProbabilisticHint {
        match &self.bloom {
            Some(bf) if !bf.may_contain(key.as_bytes()) => ProbabilisticHint::DefinitelyNot,
            _ => ProbabilisticHint::Maybe,
        }
    }

    /// Looks up `key` by binary search, returning the raw entry with no
    /// expiry interpretation applied; the caller decides what an expired
    /// entry means. Needed by the read path, where "no entry in this run"
    /// and "entry in this run but expired" are different outcomes (the
    /// latter must still shadow an older value in a deeper run).
    #[must_use]
    pub fn lookup_raw(&self, key: &str) -> Option<&VersionedEntry> {
        if self.contains_key(key) == ProbabilisticHint::DefinitelyNot {
            return None;
        }
        let idx = self
            .entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()?;
        Some(&self.entries[idx].1)
    }

    /// Looks up `key` by binary search. Expired entries are treated as
    /// absent.
    #[must_use]
    pub fn lookup(&self, key: &str, now_ms: i64) -> Option<&VersionedEntry> {
        let entry = self.lookup_raw(key)?;
        if matches!(entry.expires_at, Some(at) if at <= now_ms) {
            None
        } else {
            Some(entry)
        }
    }

    /// Yields all entries in ascending key order, including tombstones.
    pub fn entries_sorted(&self) -> impl Iterator<Item = &(String, VersionedEntry)> {
        self.entries.iter()
    }

    /// Returns `true` if this run's key range intersects `other`'s.
    #[must_use]
    pub fn overlaps(&self, other: &Run) -> bool {
        self.metadata.min_key <= other.metadata.max_key
            && other.metadata.min_key <= self.metadata.max_key
    }

    /// Returns this run's metadata.
    #[must_use]
    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    /// Returns the number of entries in the run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the run holds no entries. Only possible for a run
    /// that was never constructed via [`Run::new`] (which forbids it); kept
    /// for API symmetry with `Memtable::is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Approximate byte footprint of one entry, matching the memtable's
/// accounting so `byte_size` is comparable across memtable and run.
fn entry_size(key: &str, entry: &VersionedEntry) -> usize {
    use memtable::Value;
    let value_len = match &entry.value {
        Value::Present(bytes) => bytes.len(),
        Value::Tombstone => 0,
    };
    key.len() + value_len + 8 + entry.expires_at.map_or(0, |_| 8) + 4
}

#[cfg(test)]
mod tests;
