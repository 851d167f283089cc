//! The command channel: a closed enum of every operation the engine
//! supports, and the matching result enum.
//!
//! `Engine::execute` is the single dispatch point a host command channel is
//! expected to call. It validates arguments, then delegates to the matching
//! typed method (`Engine::set`, `Engine::get`, ...) so each method remains
//! independently unit-testable, following the teacher's `write.rs` /
//! `read.rs` / `compaction.rs` module split.

use crate::errors::EngineError;
use crate::stats::EngineStats;
use crate::Engine;

/// A single engine operation and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `SET key value [ttl_ms]`.
    Set {
        /// The key to write.
        key: String,
        /// The value to write.
        value: Vec<u8>,
        /// Optional TTL in milliseconds; must be positive if supplied.
        ttl_ms: Option<u64>,
    },
    /// `GET key`.
    Get {
        /// The key to look up.
        key: String,
    },
    /// `DEL key`.
    Del {
        /// The key to delete.
        key: String,
    },
    /// `EXISTS key`.
    Exists {
        /// The key to check.
        key: String,
    },
    /// `EXPIRE key ttl_ms`.
    Expire {
        /// The key whose expiry to set.
        key: String,
        /// The TTL in milliseconds; must be positive.
        ttl_ms: u64,
    },
    /// `TTL key`.
    Ttl {
        /// The key to check.
        key: String,
    },
    /// `INCR key`.
    Incr {
        /// The key to increment.
        key: String,
    },
    /// `DECR key`.
    Decr {
        /// The key to decrement.
        key: String,
    },
    /// `KEYS [pattern]`.
    Keys {
        /// An optional glob pattern; `None` matches every key.
        pattern: Option<String>,
    },
    /// `MGET [key]`.
    MGet {
        /// The keys to look up, in order.
        keys: Vec<String>,
    },
    /// `MSET [(key, value, ttl_ms?)]`.
    MSet {
        /// The entries to write, applied sequentially with no cross-element
        /// atomicity guarantee.
        entries: Vec<(String, Vec<u8>, Option<u64>)>,
    },
    /// `FLUSHALL`.
    FlushAll,
    /// `INFO`.
    Info,
}

/// The result of a successfully executed [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// No meaningful return value (`SET`, `MSET`, `FLUSHALL`).
    Unit,
    /// A value or its absence (`GET`).
    Value(Option<Vec<u8>>),
    /// A boolean outcome (`DEL`, `EXISTS`, `EXPIRE`).
    Bool(bool),
    /// An integer outcome (`TTL`, `INCR`, `DECR`).
    Int(i64),
    /// A list of keys (`KEYS`).
    Keys(Vec<String>),
    /// A list of values or absences, order preserved (`MGET`).
    Values(Vec<Option<Vec<u8>>>),
    /// The `INFO` snapshot.
    Stats(EngineStats),
}

impl Engine {
    /// Validates and dispatches `command`, returning its result or an
    /// [`EngineError`].
    ///
    /// Validation failures are surfaced without side effects: every
    /// argument check happens before the matching method touches the
    /// memtable or WAL.
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, EngineError> {
        match command {
            Command::Set { key, value, ttl_ms } => {
                self.set(key, value, ttl_ms)?;
                Ok(CommandResult::Unit)
            }
            Command::Get { key } => Ok(CommandResult::Value(self.get(&key)?)),
            Command::Del { key } => Ok(CommandResult::Bool(self.del(&key)?)),
            Command::Exists { key } => Ok(CommandResult::Bool(self.exists(&key)?)),
            Command::Expire { key, ttl_ms } => {
                Ok(CommandResult::Bool(self.expire(&key, ttl_ms)?))
            }
            Command::Ttl { key } => Ok(CommandResult::Int(self.ttl(&key)?)),
            Command::Incr { key } => Ok(CommandResult::Int(self.incr(&key)?)),
            Command::Decr { key } => Ok(CommandResult::Int(self.decr(&key)?)),
            Command::Keys { pattern } => Ok(CommandResult::Keys(self.keys(pattern.as_deref())?)),
            Command::MGet { keys } => Ok(CommandResult::Values(self.mget(&keys)?)),
            Command::MSet { entries } => {
                self.mset(entries)?;
                Ok(CommandResult::Unit)
            }
            Command::FlushAll => {
                self.flush_all();
                Ok(CommandResult::Unit)
            }
            Command::Info => Ok(CommandResult::Stats(self.info())),
        }
    }
}
