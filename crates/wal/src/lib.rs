//! # WAL — Write-Ahead Log
//!
//! The per-generation operation record paired with the current memtable.
//!
//! Every mutation (`SET`, `DEL`, `EXPIRE`) is appended to the WAL **before**
//! the corresponding memtable update, so that if the engine were ever
//! reconstructed from an externally-provided WAL seed, replaying it would
//! reproduce the current session's un-flushed tail. The log is purely
//! in-memory: this engine's durability story stops at "survive within the
//! current process" (see the crate root docs in `engine` for the full
//! scope statement); there is no on-disk file, CRC framing, or fsync here.
//!
//! `flush` is kept as a retained call site — a durable variant of this WAL
//! would sync bytes there — so that call sites in `engine` don't need to
//! change if a durable WAL is added later.
//!
//! ## Example
//!
//! ```rust
//! use wal::{WalLog, WalRecord};
//!
//! let mut log = WalLog::new();
//! log.append(WalRecord::Set {
//!     key: "hello".to_string(),
//!     value: b"world".to_vec(),
//!     ttl_ms: None,
//! });
//! assert_eq!(log.len(), 1);
//! log.clear();
//! assert!(log.is_empty());
//! ```

use thiserror::Error;

/// A single WAL record: the operation, its key, and any operation-specific
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalRecord {
    /// A key-value insertion, optionally with a TTL in milliseconds.
    Set {
        /// The lookup key.
        key: String,
        /// The payload value.
        value: Vec<u8>,
        /// Time-to-live in milliseconds from the moment of the write, if any.
        ttl_ms: Option<u64>,
    },
    /// A key deletion (tombstone).
    Del {
        /// The key to delete.
        key: String,
    },
    /// An expiry update on an existing key.
    Expire {
        /// The key whose expiry is being set.
        key: String,
        /// Time-to-live in milliseconds from the moment of the write.
        ttl_ms: u64,
    },
}

impl WalRecord {
    /// Returns the key this record applies to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            WalRecord::Set { key, .. } | WalRecord::Del { key } | WalRecord::Expire { key, .. } => {
                key
            }
        }
    }
}

/// Errors that can occur during WAL operations.
///
/// The in-memory WAL cannot actually fail today; this type is kept (rather
/// than making `append`/`flush` infallible) so a durable variant can be
/// swapped in later without changing call sites in `engine`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalError {
    /// A durable backing store failed to sync. Never constructed by the
    /// in-memory implementation.
    #[error("io error: {0}")]
    Io(String),
}

/// Append-only in-memory log of pending operations for the current memtable
/// generation.
#[derive(Debug, Default)]
pub struct WalLog {
    records: Vec<WalRecord>,
}

impl WalLog {
    /// Creates a new, empty WAL.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a record to the log.
    ///
    /// Called synchronously with every mutating memtable update, before the
    /// memtable is mutated.
    pub fn append(&mut self, record: WalRecord) {
        self.records.push(record);
    }

    /// No-op in the pure in-process design. A durable variant would sync
    /// bytes to its backing store here.
    ///
    /// # Errors
    ///
    /// Always `Ok` today; kept fallible for forward compatibility.
    pub fn flush(&mut self) -> Result<(), WalError> {
        Ok(())
    }

    /// Clears the log. Invoked when the memtable is flushed to an L0 run.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Yields the log's entries in append order.
    pub fn replay(&self) -> impl Iterator<Item = &WalRecord> {
        self.records.iter()
    }

    /// Returns the number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the log holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
