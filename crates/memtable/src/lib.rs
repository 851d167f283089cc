//! # Memtable
//!
//! An in-memory, sorted, mutable write buffer for the storage engine.
//!
//! The memtable is the first point of contact for every write operation. It buffers
//! recent writes and deletes in a sorted structure (`BTreeMap`) before they are
//! flushed to immutable in-memory runs.
//!
//! ## Key properties
//! - **Sorted order**: entries are always in ascending key order (required for run flush).
//! - **Version-gated**: every write to a key strictly increases that key's version.
//! - **Tombstone support**: deletes are recorded as `Value::Tombstone` markers.
//! - **TTL support**: an entry may carry an absolute expiry. Lookups read an
//!   expired entry as absent without mutating the map; actual removal is a
//!   separate, explicit sweep so reads stay a pure `&self` operation.
//! - **Approximate size tracking**: tracks the byte footprint of entries for flush
//!   threshold decisions.
//!
//! ## Example
//! ```rust
//! use clock::SystemClock;
//! use memtable::{EntryLookup, Memtable, Value};
//!
//! let clock = SystemClock;
//! let mut m = Memtable::new();
//! m.put("hello".to_string(), Value::Present(b"world".to_vec()), None, &clock);
//! match m.get("hello", &clock) {
//!     EntryLookup::Present(entry) => assert_eq!(entry.value, Value::Present(b"world".to_vec())),
//!     _ => panic!("expected a present entry"),
//! }
//!
//! m.delete("hello", &clock);
//! assert!(matches!(m.get("hello", &clock), EntryLookup::Absent));
//! ```

use std::collections::BTreeMap;

use clock::Clock;
use pattern::Pattern;

/// A stored payload, or the marker that a key has been deleted.
///
/// Tombstones are retained in the memtable and flushed to runs so that older
/// values in deeper levels are correctly shadowed during reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A live value.
    Present(Vec<u8>),
    /// A delete marker.
    Tombstone,
}

impl Value {
    /// Returns the byte length counted toward `size_bytes`: the payload length
    /// for a live value, 0 for a tombstone.
    fn cost(&self) -> usize {
        match self {
            Value::Present(bytes) => bytes.len(),
            Value::Tombstone => 0,
        }
    }

    /// Returns `true` if this is a tombstone.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Value::Tombstone)
    }
}

/// A single versioned entry in the memtable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedEntry {
    /// The stored payload, or a tombstone.
    pub value: Value,
    /// Absolute millisecond timestamp at write.
    pub created_at: i64,
    /// Absolute millisecond expiry, if any.
    pub expires_at: Option<i64>,
    /// Monotone-increasing version, scoped per key.
    pub version: u64,
}

impl VersionedEntry {
    fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expires_at, Some(at) if at <= now_ms)
    }

    /// Approximate byte footprint of this entry, matching the teacher's
    /// `approx_size` bookkeeping extended with the metadata fields this
    /// engine tracks per entry.
    fn size(&self, key_len: usize) -> usize {
        key_len + self.value.cost() + 8 + self.expires_at.map_or(0, |_| 8) + 4
    }
}

/// Result of a memtable lookup, distinguishing "deleted" from "never written".
#[derive(Debug)]
pub enum EntryLookup<'a> {
    /// A live entry exists.
    Present(&'a VersionedEntry),
    /// The key was deleted (or has expired).
    Tombstone,
    /// The key has never been written.
    Absent,
}

/// An ordered, in-memory write buffer backed by a `BTreeMap`.
///
/// The memtable tracks an approximate byte size so the engine can decide when
/// to flush to a run. Every write to a key strictly increases that key's
/// version, derived from the superseded entry's version (or 1 for a new key).
#[derive(Debug)]
pub struct Memtable {
    map: BTreeMap<String, VersionedEntry>,
    size_bytes: usize,
}

impl Memtable {
    /// Creates a new, empty memtable.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
            size_bytes: 0,
        }
    }

    /// Inserts or overwrites `key` with `value`, optionally carrying a TTL in
    /// milliseconds.
    ///
    /// `created_at` is taken from `clock.now_ms()`. `expires_at` is
    /// `created_at + ttl_ms` when `ttl_ms` is `Some`. `version` is the
    /// superseded entry's version plus one, or 1 for a new key.
    pub fn put(&mut self, key: String, value: Value, ttl_ms: Option<u64>, clock: &dyn Clock) {
        let now = clock.now_ms();
        let version = match self.map.get(&key) {
            Some(old) => old.version.saturating_add(1),
            None => 1,
        };
        let entry = VersionedEntry {
            value,
            created_at: now,
            expires_at: ttl_ms.map(|ms| now.saturating_add(ms as i64)),
            version,
        };
        self.replace(key, entry);
    }

    /// Looks up `key`. An expired entry reads as absent but is not removed;
    /// actual eviction happens only via [`Memtable::evict_if_expired`] (the
    /// TTL sweep) or naturally at the next flush, keeping lookups a pure
    /// `&self` operation.
    #[must_use]
    pub fn get(&self, key: &str, clock: &dyn Clock) -> EntryLookup<'_> {
        let now = clock.now_ms();
        match self.map.get(key) {
            None => EntryLookup::Absent,
            Some(entry) if entry.is_expired(now) => EntryLookup::Absent,
            Some(entry) if entry.value.is_tombstone() => EntryLookup::Tombstone,
            Some(entry) => EntryLookup::Present(entry),
        }
    }

    /// Looks up the raw entry for `key`, if any, including tombstones and
    /// expired entries, with no interpretation applied. Needed by the read
    /// path, where "no entry here" and "entry here but expired" are
    /// different outcomes (the latter must still shadow an older value in a
    /// run).
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&VersionedEntry> {
        self.map.get(key)
    }

    /// Removes `key` if it is present and has expired. Returns `true` if it
    /// was removed. The only mutating path for expiry; driven by the
    /// engine's TTL sweep.
    pub fn evict_if_expired(&mut self, key: &str, clock: &dyn Clock) -> bool {
        let now = clock.now_ms();
        match self.map.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.remove_accounted(key);
                true
            }
            _ => false,
        }
    }

    /// Writes a tombstone for `key`. Returns `true` if a live (non-tombstoned,
    /// non-expired) entry existed beforehand.
    pub fn delete(&mut self, key: &str, clock: &dyn Clock) -> bool {
        let now = clock.now_ms();
        let existed = match self.map.get(key) {
            Some(entry) => !entry.value.is_tombstone() && !entry.is_expired(now),
            None => false,
        };
        let version = match self.map.get(key) {
            Some(old) => old.version.saturating_add(1),
            None => 1,
        };
        let entry = VersionedEntry {
            value: Value::Tombstone,
            created_at: now,
            expires_at: None,
            version,
        };
        self.replace(key.to_string(), entry);
        existed
    }

    /// Updates the expiry of a live entry. Returns `false` if no live entry
    /// exists for `key`.
    pub fn expire(&mut self, key: &str, ttl_ms: u64, clock: &dyn Clock) -> bool {
        let now = clock.now_ms();
        match self.map.get_mut(key) {
            Some(entry) if !entry.value.is_tombstone() && !entry.is_expired(now) => {
                let key_len = key.len();
                self.size_bytes = self.size_bytes.saturating_sub(entry.size(key_len));
                entry.expires_at = Some(now.saturating_add(ttl_ms as i64));
                self.size_bytes = self.size_bytes.saturating_add(entry.size(key_len));
                true
            }
            _ => false,
        }
    }

    /// Returns the remaining TTL in whole seconds (rounded up), `-1` if the
    /// key is present without an expiry, or `-2` if absent.
    #[must_use]
    pub fn ttl(&self, key: &str, clock: &dyn Clock) -> i64 {
        let now = clock.now_ms();
        match self.map.get(key) {
            None => -2,
            Some(entry) if entry.value.is_tombstone() || entry.is_expired(now) => -2,
            Some(entry) => match entry.expires_at {
                None => -1,
                Some(at) => {
                    let remaining_ms = at - now;
                    if remaining_ms <= 0 {
                        -2
                    } else {
                        (remaining_ms + 999) / 1000
                    }
                }
            },
        }
    }

    /// Returns the current version for `key`, regardless of whether the
    /// entry is a tombstone or expired. Used by the engine to check for
    /// version-counter overflow before a write.
    #[must_use]
    pub fn version_of(&self, key: &str) -> Option<u64> {
        self.map.get(key).map(|e| e.version)
    }

    /// Returns live keys (skipping tombstones and expired entries) matching
    /// `pattern`, or all live keys if `pattern` is `None`.
    #[must_use]
    pub fn keys(&self, pattern: Option<&str>, clock: &dyn Clock) -> Vec<String> {
        let now = clock.now_ms();
        let compiled = Pattern::compile_opt(pattern);
        self.map
            .iter()
            .filter(|(_, e)| !e.value.is_tombstone() && !e.is_expired(now))
            .filter(|(k, _)| compiled.matches(k))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Yields all entries (including tombstones, excluding expired ones) in
    /// ascending key order. Used at flush time.
    pub fn iter_sorted(&self, clock: &dyn Clock) -> impl Iterator<Item = (&String, &VersionedEntry)> {
        let now = clock.now_ms();
        self.map.iter().filter(move |(_, e)| !e.is_expired(now))
    }

    /// Returns every key currently stored, including tombstones and expired
    /// entries that have not yet been swept. Unlike [`Memtable::keys`], this
    /// does not filter by liveness; it's the candidate source for the TTL
    /// sweep, which specifically needs to find entries `keys()` would hide.
    #[must_use]
    pub fn all_keys(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }

    /// Returns the approximate byte size of all keys and entries stored.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Returns the number of entries (including tombstones).
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if `size_bytes()` has crossed `threshold_bytes`.
    #[must_use]
    pub fn should_flush(&self, threshold_bytes: usize) -> bool {
        self.size_bytes >= threshold_bytes
    }

    /// Returns `true` if the memtable contains zero entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Removes all entries and resets `size_bytes` to zero.
    pub fn clear(&mut self) {
        self.map.clear();
        self.size_bytes = 0;
    }

    // ---- Internal helpers ----

    fn replace(&mut self, key: String, entry: VersionedEntry) {
        let key_len = key.len();
        if let Some(old) = self.map.get(&key) {
            self.size_bytes = self.size_bytes.saturating_sub(old.size(key_len));
        }
        self.size_bytes = self.size_bytes.saturating_add(entry.size(key_len));
        self.map.insert(key, entry);
    }

    fn remove_accounted(&mut self, key: &str) {
        if let Some(old) = self.map.remove(key) {
            self.size_bytes = self.size_bytes.saturating_sub(old.size(key.len()));
        }
    }
}

impl Default for Memtable {
    fn default() -> Self {
        Self::new()
    }
}
