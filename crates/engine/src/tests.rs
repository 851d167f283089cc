use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use clock::ManualClock;
use config::EngineConfig;

use super::*;

fn engine_with_clock() -> (Engine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000));
    let engine = Engine::with_clock(EngineConfig::default(), clock.clone());
    (engine, clock)
}

fn small_memtable_engine() -> (Engine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000));
    let config = EngineConfig {
        max_memtable_size_mb: 0,
        ..EngineConfig::default()
    };
    let engine = Engine::with_clock(config, clock.clone());
    (engine, clock)
}

// -------------------- SET / GET / DEL --------------------

#[test]
fn set_then_get_round_trips() {
    let (mut e, _clock) = engine_with_clock();
    e.set("k".to_string(), b"v".to_vec(), None).unwrap();
    assert_eq!(e.get("k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn get_missing_key_is_none() {
    let (mut e, _clock) = engine_with_clock();
    assert_eq!(e.get("nope").unwrap(), None);
}

#[test]
fn set_rejects_empty_key() {
    let (mut e, _clock) = engine_with_clock();
    let err = e.set(String::new(), b"v".to_vec(), None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Validation);
}

#[test]
fn set_rejects_zero_ttl() {
    let (mut e, _clock) = engine_with_clock();
    let err = e
        .set("k".to_string(), b"v".to_vec(), Some(0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Validation);
}

#[test]
fn del_removes_live_key_and_reports_existed() {
    let (mut e, _clock) = engine_with_clock();
    e.set("k".to_string(), b"v".to_vec(), None).unwrap();
    assert!(e.del("k").unwrap());
    assert_eq!(e.get("k").unwrap(), None);
}

#[test]
fn del_missing_key_reports_false() {
    let (mut e, _clock) = engine_with_clock();
    assert!(!e.del("nope").unwrap());
}

#[test]
fn exists_reflects_get() {
    let (mut e, _clock) = engine_with_clock();
    assert!(!e.exists("k").unwrap());
    e.set("k".to_string(), b"v".to_vec(), None).unwrap();
    assert!(e.exists("k").unwrap());
    e.del("k").unwrap();
    assert!(!e.exists("k").unwrap());
}

// -------------------- EXPIRE / TTL --------------------

#[test]
fn ttl_absent_key_is_minus_two() {
    let (mut e, _clock) = engine_with_clock();
    assert_eq!(e.ttl("nope").unwrap(), -2);
}

#[test]
fn ttl_without_expiry_is_minus_one() {
    let (mut e, _clock) = engine_with_clock();
    e.set("k".to_string(), b"v".to_vec(), None).unwrap();
    assert_eq!(e.ttl("k").unwrap(), -1);
}

#[test]
fn ttl_counts_down_and_expires() {
    let (mut e, clock) = engine_with_clock();
    e.set("k".to_string(), b"v".to_vec(), Some(5_000)).unwrap();
    assert_eq!(e.ttl("k").unwrap(), 5);
    clock.advance(6_000);
    assert_eq!(e.ttl("k").unwrap(), -2);
    assert_eq!(e.get("k").unwrap(), None);
}

#[test]
fn expire_updates_ttl_of_live_key() {
    let (mut e, _clock) = engine_with_clock();
    e.set("k".to_string(), b"v".to_vec(), None).unwrap();
    assert!(e.expire("k", 10_000).unwrap());
    assert_eq!(e.ttl("k").unwrap(), 10);
}

#[test]
fn expire_returns_false_for_missing_key() {
    let (mut e, _clock) = engine_with_clock();
    assert!(!e.expire("nope", 1_000).unwrap());
}

// -------------------- INCR / DECR --------------------

#[test]
fn incr_on_absent_key_starts_at_one() {
    let (mut e, _clock) = engine_with_clock();
    assert_eq!(e.incr("counter").unwrap(), 1);
    assert_eq!(e.incr("counter").unwrap(), 2);
}

#[test]
fn decr_on_absent_key_starts_at_minus_one() {
    let (mut e, _clock) = engine_with_clock();
    assert_eq!(e.decr("counter").unwrap(), -1);
}

#[test]
fn incr_on_non_numeric_value_treats_it_as_zero() {
    let (mut e, _clock) = engine_with_clock();
    e.set("k".to_string(), b"not-a-number".to_vec(), None)
        .unwrap();
    assert_eq!(e.incr("k").unwrap(), 1);
}

// -------------------- KEYS / MGET / MSET --------------------

#[test]
fn keys_with_no_pattern_returns_all_live_keys() {
    let (mut e, _clock) = engine_with_clock();
    e.set("a".to_string(), b"1".to_vec(), None).unwrap();
    e.set("b".to_string(), b"2".to_vec(), None).unwrap();
    e.del("b").unwrap();
    let mut keys = e.keys(None).unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string()]);
}

#[test]
fn keys_applies_glob_pattern() {
    let (mut e, _clock) = engine_with_clock();
    e.set("user:1".to_string(), b"x".to_vec(), None).unwrap();
    e.set("session:1".to_string(), b"y".to_vec(), None)
        .unwrap();
    assert_eq!(e.keys(Some("user:*")).unwrap(), vec!["user:1".to_string()]);
}

#[test]
fn mget_preserves_order_and_mixes_hits_and_misses() {
    let (mut e, _clock) = engine_with_clock();
    e.set("a".to_string(), b"1".to_vec(), None).unwrap();
    let results = e
        .mget(&["a".to_string(), "missing".to_string()])
        .unwrap();
    assert_eq!(results, vec![Some(b"1".to_vec()), None]);
}

#[test]
fn mset_applies_every_entry() {
    let (mut e, _clock) = engine_with_clock();
    e.mset(vec![
        ("a".to_string(), b"1".to_vec(), None),
        ("b".to_string(), b"2".to_vec(), None),
    ])
    .unwrap();
    assert_eq!(e.get("a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(e.get("b").unwrap(), Some(b"2".to_vec()));
}

// -------------------- Flush / compaction --------------------

#[test]
fn oversized_write_triggers_flush_to_l0() {
    let (mut e, _clock) = small_memtable_engine();
    e.set("k".to_string(), b"v".to_vec(), None).unwrap();
    assert_eq!(e.l0_run_count(), 1);
    assert_eq!(e.get("k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn value_survives_across_a_flush() {
    let (mut e, _clock) = small_memtable_engine();
    e.set("k1".to_string(), b"v1".to_vec(), None).unwrap();
    e.set("k2".to_string(), b"v2".to_vec(), None).unwrap();
    assert!(e.l0_run_count() >= 1);
    assert_eq!(e.get("k1").unwrap(), Some(b"v1".to_vec()));
    assert_eq!(e.get("k2").unwrap(), Some(b"v2".to_vec()));
}

#[test]
fn delete_after_flush_shadows_the_flushed_value() {
    let (mut e, _clock) = small_memtable_engine();
    e.set("k".to_string(), b"v".to_vec(), None).unwrap();
    assert_eq!(e.l0_run_count(), 1);
    e.del("k").unwrap();
    assert_eq!(e.get("k").unwrap(), None);
}

#[test]
fn expiry_of_the_newest_write_shadows_an_older_flushed_value() {
    let (mut e, clock) = small_memtable_engine();
    e.set("k".to_string(), b"v1".to_vec(), None).unwrap();
    assert_eq!(e.l0_run_count(), 1, "v1 should have flushed to an l0 run");

    e.set("k".to_string(), b"v2".to_vec(), Some(100)).unwrap();
    clock.advance(200);

    assert_eq!(
        e.get("k").unwrap(),
        None,
        "the newest write expired; an older live copy in a run must not shine through"
    );
}

#[test]
fn flushing_past_l0_trigger_compacts_into_l1() {
    let (mut e, _clock) = small_memtable_engine();
    for i in 0..(L0_COMPACTION_TRIGGER + 1) {
        e.set(format!("k{i}"), b"v".to_vec(), None).unwrap();
    }
    assert_eq!(e.l0_run_count(), 0, "L0 should have compacted away");
    assert!(e.run_count() >= 1, "merged output should land at L1");
    for i in 0..(L0_COMPACTION_TRIGGER + 1) {
        assert_eq!(e.get(&format!("k{i}")).unwrap(), Some(b"v".to_vec()));
    }
}

#[test]
fn compaction_preserves_the_newest_version_of_overwritten_keys() {
    let (mut e, _clock) = small_memtable_engine();
    e.set("k".to_string(), b"old".to_vec(), None).unwrap();
    for i in 0..(L0_COMPACTION_TRIGGER + 1) {
        e.set(format!("filler{i}"), b"v".to_vec(), None).unwrap();
    }
    e.set("k".to_string(), b"new".to_vec(), None).unwrap();
    for i in 0..(L0_COMPACTION_TRIGGER + 1) {
        e.set(format!("filler2-{i}"), b"v".to_vec(), None).unwrap();
    }
    assert_eq!(e.get("k").unwrap(), Some(b"new".to_vec()));
}

#[test]
fn force_flush_is_a_no_op_on_an_empty_memtable() {
    let (mut e, _clock) = engine_with_clock();
    e.force_flush();
    assert_eq!(e.run_count(), 0);
}

#[test]
fn maybe_run_compaction_tick_is_idle_below_every_threshold() {
    let (mut e, _clock) = engine_with_clock();
    e.set("k".to_string(), b"v".to_vec(), None).unwrap();
    e.maybe_run_compaction_tick();
    assert_eq!(e.run_count(), 0);
}

// -------------------- flush_all --------------------

#[test]
fn flush_all_clears_everything() {
    let (mut e, _clock) = small_memtable_engine();
    e.set("k".to_string(), b"v".to_vec(), None).unwrap();
    assert!(e.run_count() > 0 || e.get("k").unwrap().is_some());
    e.flush_all();
    assert_eq!(e.get("k").unwrap(), None);
    assert_eq!(e.run_count(), 0);
}

// -------------------- sweep_expired_sample --------------------

#[test]
fn sweep_expired_sample_evicts_expired_memtable_keys() {
    let (mut e, clock) = engine_with_clock();
    e.set("k1".to_string(), b"v".to_vec(), Some(1)).unwrap();
    e.set("k2".to_string(), b"v".to_vec(), None).unwrap();
    clock.advance(10);

    assert_eq!(
        e.info().memtable.entry_count,
        2,
        "expired entry is still physically present before the sweep"
    );
    e.sweep_expired_sample(10);
    assert_eq!(
        e.info().memtable.entry_count,
        1,
        "sweep must physically remove the expired entry, not just hide it"
    );
    assert_eq!(e.get("k1").unwrap(), None);
    assert_eq!(e.get("k2").unwrap(), Some(b"v".to_vec()));
}

// -------------------- INFO --------------------

#[test]
fn info_reports_memtable_and_run_totals() {
    let (mut e, _clock) = engine_with_clock();
    e.set("a".to_string(), b"1".to_vec(), None).unwrap();
    e.set("b".to_string(), b"2".to_vec(), None).unwrap();
    let stats = e.info();
    assert_eq!(stats.memtable.entry_count, 2);
    assert_eq!(stats.total_entries, 2);
    assert!(stats.runs.is_empty());
}

// -------------------- Command / execute dispatch --------------------

#[test]
fn execute_set_then_get_round_trips() {
    let (mut e, _clock) = engine_with_clock();
    let result = e
        .execute(Command::Set {
            key: "k".to_string(),
            value: b"v".to_vec(),
            ttl_ms: None,
        })
        .unwrap();
    assert_eq!(result, CommandResult::Unit);
    let result = e
        .execute(Command::Get {
            key: "k".to_string(),
        })
        .unwrap();
    assert_eq!(result, CommandResult::Value(Some(b"v".to_vec())));
}

#[test]
fn execute_propagates_validation_errors() {
    let (mut e, _clock) = engine_with_clock();
    let err = e
        .execute(Command::Set {
            key: String::new(),
            value: b"v".to_vec(),
            ttl_ms: None,
        })
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Validation);
}

#[test]
fn execute_info_returns_stats() {
    let (mut e, _clock) = engine_with_clock();
    let result = e.execute(Command::Info).unwrap();
    assert!(matches!(result, CommandResult::Stats(_)));
}

// -------------------- Observers --------------------

struct CountingObserver {
    count: AtomicUsize,
    last: Mutex<Option<String>>,
}

impl EngineObserver for CountingObserver {
    fn on_event(&self, event: &Event) {
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(format!("{event:?}"));
    }
}

#[test]
fn observer_receives_set_and_get_events() {
    let (mut e, _clock) = engine_with_clock();
    let observer = Arc::new(CountingObserver {
        count: AtomicUsize::new(0),
        last: Mutex::new(None),
    });
    e.add_observer(Box::new(ObserverHandle(observer.clone())));
    e.set("k".to_string(), b"v".to_vec(), None).unwrap();
    e.get("k").unwrap();
    assert_eq!(observer.count.load(Ordering::SeqCst), 2);
}

struct ObserverHandle(Arc<CountingObserver>);

impl EngineObserver for ObserverHandle {
    fn on_event(&self, event: &Event) {
        self.0.on_event(event);
    }
}
