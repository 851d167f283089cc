use super::*;
use memtable::Value;

fn entry(value: Value, created_at: i64, version: u64) -> VersionedEntry {
    VersionedEntry {
        value,
        created_at,
        expires_at: None,
        version,
    }
}

fn entry_with_ttl(value: Value, created_at: i64, expires_at: i64, version: u64) -> VersionedEntry {
    VersionedEntry {
        value,
        created_at,
        expires_at: Some(expires_at),
        version,
    }
}

fn sorted_pairs(pairs: Vec<(&str, VersionedEntry)>) -> Vec<(String, VersionedEntry)> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

// -------------------- Construction --------------------

#[test]
fn new_run_tracks_metadata() {
    let entries = sorted_pairs(vec![
        ("a", entry(Value::Present(b"1".to_vec()), 100, 1)),
        ("b", entry(Value::Present(b"2".to_vec()), 100, 1)),
        ("c", entry(Value::Tombstone, 100, 1)),
    ]);
    let run = Run::new(1, 0, entries, true, 100);
    assert_eq!(run.metadata().id, 1);
    assert_eq!(run.metadata().level, 0);
    assert_eq!(run.metadata().min_key, "a");
    assert_eq!(run.metadata().max_key, "c");
    assert_eq!(run.metadata().entry_count, 3);
    assert_eq!(run.len(), 3);
    assert!(!run.is_empty());
}

#[test]
#[should_panic(expected = "refusing to build an empty run")]
fn new_run_panics_on_empty_input() {
    Run::new(1, 0, Vec::new(), true, 0);
}

// -------------------- Lookup --------------------

#[test]
fn lookup_finds_present_entry() {
    let entries = sorted_pairs(vec![("k", entry(Value::Present(b"v".to_vec()), 0, 1))]);
    let run = Run::new(1, 0, entries, true, 0);
    let found = run.lookup("k", 0).unwrap();
    assert_eq!(found.value, Value::Present(b"v".to_vec()));
}

#[test]
fn lookup_missing_key_returns_none() {
    let entries = sorted_pairs(vec![("k", entry(Value::Present(b"v".to_vec()), 0, 1))]);
    let run = Run::new(1, 0, entries, true, 0);
    assert!(run.lookup("nope", 0).is_none());
}

#[test]
fn lookup_expired_entry_returns_none() {
    let entries = sorted_pairs(vec![(
        "k",
        entry_with_ttl(Value::Present(b"v".to_vec()), 0, 100, 1),
    )]);
    let run = Run::new(1, 0, entries, true, 0);
    assert!(run.lookup("k", 50).is_some());
    assert!(run.lookup("k", 200).is_none());
}

#[test]
fn lookup_raw_returns_expired_entry_instead_of_none() {
    let entries = sorted_pairs(vec![(
        "k",
        entry_with_ttl(Value::Present(b"v".to_vec()), 0, 100, 1),
    )]);
    let run = Run::new(1, 0, entries, true, 0);
    let found = run.lookup_raw("k").unwrap();
    assert_eq!(found.value, Value::Present(b"v".to_vec()));
    assert!(run.lookup_raw("nope").is_none());
}

#[test]
fn lookup_without_bloom_still_works() {
    let entries = sorted_pairs(vec![("k", entry(Value::Present(b"v".to_vec()), 0, 1))]);
    let run = Run::new(1, 0, entries, false, 0);
    assert!(run.lookup("k", 0).is_some());
    assert!(run.lookup("nope", 0).is_none());
}

#[test]
fn bloom_filter_definitively_rules_out_missing_keys() {
    let entries = sorted_pairs(vec![("k", entry(Value::Present(b"v".to_vec()), 0, 1))]);
    let run = Run::new(1, 0, entries, true, 0);
    assert_eq!(run.contains_key("k"), ProbabilisticHint::Maybe);
    // a key nowhere near what was inserted should usually be ruled out;
    // not asserted here since bloom filters admit false positives by design,
    // but it must never be DefinitelyNot for a key that's actually present.
    assert_ne!(run.contains_key("k"), ProbabilisticHint::DefinitelyNot);
}

// -------------------- entries_sorted / overlaps --------------------

#[test]
fn entries_sorted_yields_in_order() {
    let entries = sorted_pairs(vec![
        ("a", entry(Value::Present(b"1".to_vec()), 0, 1)),
        ("b", entry(Value::Present(b"2".to_vec()), 0, 1)),
    ]);
    let run = Run::new(1, 0, entries, true, 0);
    let keys: Vec<&str> = run.entries_sorted().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn overlaps_detects_intersecting_ranges() {
    let r1 = Run::new(
        1,
        0,
        sorted_pairs(vec![
            ("a", entry(Value::Present(b"1".to_vec()), 0, 1)),
            ("m", entry(Value::Present(b"2".to_vec()), 0, 1)),
        ]),
        false,
        0,
    );
    let r2 = Run::new(
        2,
        0,
        sorted_pairs(vec![
            ("g", entry(Value::Present(b"3".to_vec()), 0, 1)),
            ("z", entry(Value::Present(b"4".to_vec()), 0, 1)),
        ]),
        false,
        0,
    );
    assert!(r1.overlaps(&r2));
}

#[test]
fn overlaps_false_for_disjoint_ranges() {
    let r1 = Run::new(
        1,
        0,
        sorted_pairs(vec![("a", entry(Value::Present(b"1".to_vec()), 0, 1))]),
        false,
        0,
    );
    let r2 = Run::new(
        2,
        0,
        sorted_pairs(vec![("z", entry(Value::Present(b"2".to_vec()), 0, 1))]),
        false,
        0,
    );
    assert!(!r1.overlaps(&r2));
}

// -------------------- Merge --------------------

#[test]
fn merge_dedups_keeping_newest_created_at() {
    let r1 = Run::new(
        1,
        0,
        sorted_pairs(vec![("k", entry(Value::Present(b"old".to_vec()), 10, 1))]),
        false,
        10,
    );
    let r2 = Run::new(
        2,
        0,
        sorted_pairs(vec![("k", entry(Value::Present(b"new".to_vec()), 20, 2))]),
        false,
        20,
    );
    // Newest run first, per the caller convention.
    let refs = [&r2, &r1];
    let mut merge = MergeIterator::new(&refs);
    let merged = merge.collect_all();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].1.value, Value::Present(b"new".to_vec()));
}

#[test]
fn merge_preserves_sorted_order_across_runs() {
    let r1 = Run::new(
        1,
        0,
        sorted_pairs(vec![
            ("a", entry(Value::Present(b"1".to_vec()), 0, 1)),
            ("c", entry(Value::Present(b"3".to_vec()), 0, 1)),
        ]),
        false,
        0,
    );
    let r2 = Run::new(
        2,
        0,
        sorted_pairs(vec![("b", entry(Value::Present(b"2".to_vec()), 0, 1))]),
        false,
        0,
    );
    let refs = [&r1, &r2];
    let mut merge = MergeIterator::new(&refs);
    let merged = merge.collect_all();
    let keys: Vec<&str> = merged.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
}

#[test]
fn merge_tombstone_shadows_older_value() {
    let r_old = Run::new(
        1,
        1,
        sorted_pairs(vec![("k", entry(Value::Present(b"v".to_vec()), 0, 1))]),
        false,
        0,
    );
    let r_new = Run::new(2, 0, sorted_pairs(vec![("k", entry(Value::Tombstone, 10, 2))]), false, 10);
    let refs = [&r_new, &r_old];
    let mut merge = MergeIterator::new(&refs);
    let merged = merge.collect_all();
    assert_eq!(merged.len(), 1);
    assert!(merged[0].1.value.is_tombstone());
}

#[test]
fn merge_empty_when_no_runs() {
    let refs: [&Run; 0] = [];
    let mut merge = MergeIterator::new(&refs);
    assert!(merge.collect_all().is_empty());
}
