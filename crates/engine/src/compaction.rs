//! Compaction policy: size-tiered at L0, leveled at L1 and deeper.
//!
//! L0 runs come straight from memtable flushes and may overlap each other.
//! Once more than [`crate::L0_COMPACTION_TRIGGER`] accumulate, every L0 run
//! is merged with whatever L1 runs it overlaps, producing a single new L1
//! run. From L1 down, each level's runs are kept non-overlapping by
//! construction, so only the oldest run at a level needs to be pushed down
//! when that level exceeds [`crate::level_threshold`].
//!
//! A merge step drops expired entries unconditionally, and drops tombstones
//! only when merging into [`crate::L_MAX`] — below the bottom level a
//! tombstone must be kept so it continues to shadow a stale value still
//! sitting in a deeper, not-yet-compacted run.

use memtable::Value;
use run::{MergeIterator, Run};

use crate::events::Event;
use crate::stats::CompactionStats;
use crate::{level_threshold, Engine, L_MAX};

fn ranges_overlap(a_min: &str, a_max: &str, b_min: &str, b_max: &str) -> bool {
    a_min <= b_max && b_min <= a_max
}

impl Engine {
    /// Runs one compaction step from `level` into `level + 1`.
    ///
    /// A no-op if a compaction is already in progress (reentrancy guard) or
    /// if `level` holds no runs. At L0 every run at the level is taken; at
    /// deeper levels only the oldest run is taken. All runs it overlaps at
    /// `level + 1` are merged in, and the result replaces them as a single
    /// new run.
    pub(crate) fn compact_step(&mut self, level: u8) {
        if self.compaction_in_progress {
            return;
        }
        let source_idx = level as usize;
        let target_level = level + 1;
        let target_idx = target_level as usize;

        let taken: Vec<Run> = if source_idx == 0 {
            std::mem::take(&mut self.levels[0])
        } else {
            match self.levels[source_idx].pop() {
                Some(run) => vec![run],
                None => return,
            }
        };
        if taken.is_empty() {
            return;
        }

        self.compaction_in_progress = true;
        self.publish(Event::CompactionStart { level: target_level });
        let start = self.clock.now_ms();

        let min_key = taken
            .iter()
            .map(|r| r.metadata().min_key.clone())
            .min()
            .expect("taken is non-empty");
        let max_key = taken
            .iter()
            .map(|r| r.metadata().max_key.clone())
            .max()
            .expect("taken is non-empty");

        let target_runs = std::mem::take(&mut self.levels[target_idx]);
        let mut overlapping = Vec::new();
        let mut disjoint = Vec::new();
        for run in target_runs {
            let m = run.metadata();
            if ranges_overlap(&min_key, &max_key, &m.min_key, &m.max_key) {
                overlapping.push(run);
            } else {
                disjoint.push(run);
            }
        }

        let input_files = taken.len() + overlapping.len();
        let input_bytes: usize = taken
            .iter()
            .chain(overlapping.iter())
            .map(|r| r.metadata().byte_size)
            .sum();
        let entries_in: usize = taken.iter().chain(overlapping.iter()).map(Run::len).sum();

        let merge_refs: Vec<&Run> = taken.iter().chain(overlapping.iter()).collect();
        let merged = MergeIterator::new(&merge_refs).collect_all();

        let now = self.clock.now_ms();
        let is_bottom = target_level == L_MAX;
        let mut entries_dropped = 0usize;
        let mut output_entries = Vec::with_capacity(merged.len());
        for (key, entry) in merged {
            if matches!(entry.expires_at, Some(at) if at <= now) {
                entries_dropped += 1;
                continue;
            }
            if is_bottom && matches!(entry.value, Value::Tombstone) {
                entries_dropped += 1;
                continue;
            }
            output_entries.push((key, entry));
        }

        let output_files;
        let output_bytes;
        if output_entries.is_empty() {
            output_files = 0;
            output_bytes = 0;
            self.levels[target_idx] = disjoint;
        } else {
            let id = self.next_run_id();
            let output_run = Run::new(
                id,
                target_level,
                output_entries,
                self.config.enable_bloom_filter,
                now,
            );
            output_files = 1;
            output_bytes = output_run.metadata().byte_size;
            disjoint.push(output_run);
            disjoint.sort_by(|a, b| b.metadata().created_at.cmp(&a.metadata().created_at));
            self.levels[target_idx] = disjoint;
        }

        let duration_ms = u64::try_from((now - start).max(0)).unwrap_or(u64::MAX);
        let stats = CompactionStats {
            level: target_level,
            input_files,
            output_files,
            input_bytes,
            output_bytes,
            duration_ms,
            entries_in,
            entries_dropped,
        };
        tracing::info!(
            level = target_level,
            input_files,
            output_files,
            entries_dropped,
            "compaction step finished"
        );
        self.compaction_history.push(stats.clone());
        self.publish(Event::CompactionEnd {
            level: target_level,
            stats,
        });
        self.compaction_in_progress = false;

        if target_level < L_MAX && self.levels[target_idx].len() > level_threshold(target_level) {
            self.compact_step(target_level);
        }
    }

    /// Runs at most one compaction step, chosen by scanning levels from L0
    /// down for the first one that has crossed its threshold.
    ///
    /// Intended to be called periodically by the host (analogous to the
    /// teacher's background compaction thread), on top of the compaction
    /// already triggered synchronously by a flush that overruns
    /// [`crate::L0_COMPACTION_TRIGGER`].
    pub fn maybe_run_compaction_tick(&mut self) {
        if self.compaction_in_progress {
            return;
        }
        if self.levels[0].len() > crate::L0_COMPACTION_TRIGGER {
            self.compact_step(0);
            return;
        }
        for level in 1..L_MAX {
            let idx = level as usize;
            if self.levels[idx].len() > level_threshold(level) {
                self.compact_step(level);
                return;
            }
        }
    }
}
