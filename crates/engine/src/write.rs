//! Write path: `set`, `del`, `expire`, `incr`/`decr`, `mset`, and the
//! internal `flush`.
//!
//! All mutations flow through this module. Each write is first appended to
//! the WAL, then applied to the in-memory memtable. When the memtable
//! crosses the configured flush threshold, it is frozen into a new L0 run
//! and the WAL is cleared.

use run::Run;
use wal::WalRecord;

use crate::errors::EngineError;
use crate::events::Event;
use crate::Engine;

impl Engine {
    /// Inserts `key` with `value`, optionally with a TTL in milliseconds
    /// (the `SET` command).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if `key` is empty or `ttl_ms` is
    /// `Some(0)`. Returns [`EngineError::Storage`] if the key's version
    /// counter would overflow; neither case mutates the memtable or WAL.
    pub fn set(&mut self, key: String, value: Vec<u8>, ttl_ms: Option<u64>) -> Result<(), EngineError> {
        Self::validate_key(&key)?;
        if let Some(ms) = ttl_ms {
            Self::validate_ttl(ms)?;
        }
        self.check_version_headroom(&key)?;

        self.wal.append(WalRecord::Set {
            key: key.clone(),
            value: value.clone(),
            ttl_ms,
        });
        self.mem.put(
            key.clone(),
            memtable::Value::Present(value.clone()),
            ttl_ms,
            self.clock.as_ref(),
        );

        tracing::trace!(key = %key, ttl_ms = ?ttl_ms, "set");
        self.publish(Event::Set { key, value, ttl_ms });
        self.maybe_flush();
        Ok(())
    }

    /// Deletes `key` by writing a tombstone (the `DEL` command). Returns
    /// `true` iff a live entry existed beforehand.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if `key` is empty.
    pub fn del(&mut self, key: &str) -> Result<bool, EngineError> {
        Self::validate_key(key)?;
        self.check_version_headroom(key)?;

        self.wal.append(WalRecord::Del {
            key: key.to_string(),
        });
        let deleted = self.mem.delete(key, self.clock.as_ref());

        self.publish(Event::Del {
            key: key.to_string(),
            deleted,
        });
        self.maybe_flush();
        Ok(deleted)
    }

    /// Updates the expiry of a live entry (the `EXPIRE` command). Returns
    /// `false` if no live entry exists.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if `key` is empty or `ttl_ms` is
    /// 0.
    pub fn expire(&mut self, key: &str, ttl_ms: u64) -> Result<bool, EngineError> {
        Self::validate_key(key)?;
        Self::validate_ttl(ttl_ms)?;
        self.check_version_headroom(key)?;

        self.wal.append(WalRecord::Expire {
            key: key.to_string(),
            ttl_ms,
        });
        let applied = self.mem.expire(key, ttl_ms, self.clock.as_ref());

        self.publish(Event::Expire {
            key: key.to_string(),
            ttl_ms,
        });
        Ok(applied)
    }

    /// Increments `key`'s value, parsed as a base-10 integer (0 if absent or
    /// unparseable), and writes `current + 1` back. Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if `key` is empty.
    pub fn incr(&mut self, key: &str) -> Result<i64, EngineError> {
        self.incr_by(key, 1)
    }

    /// Decrements `key`'s value in the same manner as [`Engine::incr`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if `key` is empty.
    pub fn decr(&mut self, key: &str) -> Result<i64, EngineError> {
        self.incr_by(key, -1)
    }

    fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64, EngineError> {
        Self::validate_key(key)?;
        let current = self.get(key)?;
        let current_val: i64 = current
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0);
        let new_val = current_val.saturating_add(delta);
        self.set(key.to_string(), new_val.to_string().into_bytes(), None)?;
        Ok(new_val)
    }

    /// Applies `SET` to each element of `entries` in order. There is no
    /// atomicity guarantee across elements: if one fails validation, earlier
    /// elements remain applied.
    ///
    /// # Errors
    ///
    /// Returns the first [`EngineError`] encountered; remaining entries are
    /// not applied.
    pub fn mset(&mut self, entries: Vec<(String, Vec<u8>, Option<u64>)>) -> Result<(), EngineError> {
        for (key, value, ttl_ms) in entries {
            self.set(key, value, ttl_ms)?;
        }
        Ok(())
    }

    /// Flushes the memtable to a new L0 run if it has crossed the
    /// configured threshold.
    pub(crate) fn maybe_flush(&mut self) {
        if self
            .mem
            .should_flush(self.config.max_memtable_size_bytes())
        {
            self.flush();
        }
    }

    /// Forces a flush of the memtable to a new L0 run, regardless of its
    /// current size. A no-op if the memtable is empty.
    pub fn force_flush(&mut self) {
        if !self.mem.is_empty() {
            self.flush();
        }
    }

    /// Internal flush: freezes the memtable's live entries into a new L0
    /// run, clears the WAL, and triggers a compaction step if L0 now
    /// exceeds `L0_COMPACTION_TRIGGER`.
    pub(crate) fn flush(&mut self) {
        let entries: Vec<(String, memtable::VersionedEntry)> = self
            .mem
            .iter_sorted(self.clock.as_ref())
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect();

        if entries.is_empty() {
            self.mem.clear();
            self.wal.clear();
            return;
        }

        let id = self.next_run_id();
        let run = Run::new(
            id,
            0,
            entries,
            self.config.enable_bloom_filter,
            self.clock.now_ms(),
        );
        self.levels[0].insert(0, run);

        self.mem.clear();
        self.wal.clear();

        tracing::debug!(run_id = id, l0_runs = self.levels[0].len(), "flushed memtable to l0 run");
        self.publish(Event::Flush {
            runs_after_l0: self.levels[0].len(),
        });

        if self.levels[0].len() > crate::L0_COMPACTION_TRIGGER {
            self.compact_step(0);
        }
    }

    /// Returns an error if writing to `key` again would overflow its
    /// per-key version counter. Checked before any mutation, mirroring the
    /// teacher's checked `seq` arithmetic in `write.rs`. Publishes
    /// `Event::Error` before returning, since this is the only storage error
    /// the write path can produce.
    fn check_version_headroom(&self, key: &str) -> Result<(), EngineError> {
        match self.mem.version_of(key) {
            Some(u64::MAX) => {
                let err = EngineError::Storage(format!(
                    "version counter overflow for key {key:?}"
                ));
                self.publish(Event::Error {
                    code: err.code(),
                    message: err.to_string(),
                });
                Err(err)
            }
            _ => Ok(()),
        }
    }
}
