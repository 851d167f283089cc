//! Merge iterator over multiple [`Run`]s.
//!
//! Produces `(key, VersionedEntry)` pairs in ascending key order. When the
//! same key appears in multiple runs, only one entry is emitted: the one
//! with the largest `(created_at, version)` pair, tie-broken by preferring
//! the source earliest in the slice passed to [`MergeIterator::new`] (the
//! caller is expected to order runs newest-first, so "earliest source" means
//! "most recently created run").
//!
//! This is the core primitive for compaction: walk N input runs in sorted
//! order, deduplicate by recency, and collect the result into a new run.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::Run;
use memtable::VersionedEntry;

/// A pending key from one run source, used for heap-based merge ordering.
struct HeapEntry {
    key: String,
    /// Index into the `runs` array.
    source: usize,
    /// Index into that run's sorted entry vector.
    pos: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source == other.source
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want the smallest key first, so
        // reverse the key comparison. On tie, prefer the lower source index
        // (the caller's "newest run" convention).
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// Merges multiple runs into a single sorted stream of `(key, VersionedEntry)`.
pub struct MergeIterator<'a> {
    runs: &'a [&'a Run],
    heap: BinaryHeap<HeapEntry>,
}

impl<'a> MergeIterator<'a> {
    /// Creates a new merge iterator over the given runs.
    ///
    /// `runs` should be ordered newest-first; that ordering resolves ties
    /// when two sources disagree on `(created_at, version)` for the same key
    /// (which should not happen in practice, since `created_at`/`version`
    /// are assigned from a single clock and per-key counter, but the tie
    /// break keeps the merge fully deterministic regardless).
    #[must_use]
    pub fn new(runs: &'a [&'a Run]) -> Self {
        let mut heap = BinaryHeap::new();
        for (i, run) in runs.iter().enumerate() {
            if let Some((key, _)) = run.entries_sorted().next() {
                heap.push(HeapEntry {
                    key: key.clone(),
                    source: i,
                    pos: 0,
                });
            }
        }
        Self { runs, heap }
    }

    fn entry_at(&self, source: usize, pos: usize) -> &'a (String, VersionedEntry) {
        &self.runs[source].entries[pos]
    }

    /// Returns the next `(key, VersionedEntry)` in sorted order, or `None`
    /// when all sources are exhausted.
    ///
    /// Duplicate keys across runs are resolved by keeping the entry with the
    /// largest `(created_at, version)` pair.
    pub fn next_entry(&mut self) -> Option<(String, VersionedEntry)> {
        let top = self.heap.pop()?;
        let (_, entry) = self.entry_at(top.source, top.pos);
        let best_key = top.key;
        let mut best_entry = entry.clone();

        if let Some((next_key, _)) = self.runs[top.source].entries.get(top.pos + 1) {
            self.heap.push(HeapEntry {
                key: next_key.clone(),
                source: top.source,
                pos: top.pos + 1,
            });
        }

        while let Some(peek) = self.heap.peek() {
            if peek.key != best_key {
                break;
            }
            let dup = self.heap.pop().unwrap();
            let (_, dup_entry) = self.entry_at(dup.source, dup.pos);

            if (dup_entry.created_at, dup_entry.version) > (best_entry.created_at, best_entry.version)
            {
                best_entry = dup_entry.clone();
            }

            if let Some((next_key, _)) = self.runs[dup.source].entries.get(dup.pos + 1) {
                self.heap.push(HeapEntry {
                    key: next_key.clone(),
                    source: dup.source,
                    pos: dup.pos + 1,
                });
            }
        }

        Some((best_key, best_entry))
    }

    /// Collects all remaining entries into a `Vec`.
    pub fn collect_all(&mut self) -> Vec<(String, VersionedEntry)> {
        let mut result = Vec::new();
        while let Some(pair) = self.next_entry() {
            result.push(pair);
        }
        result
    }
}
