//! Change set properties checked over a range of snapshot pairs.

use std::sync::Arc;
use std::thread;

use config_change_core::{ChangeSet, ChangeSetBuilder, ChangeType, Snapshot};
use ntest::timeout;

fn pairs() -> Vec<(Snapshot, Snapshot)> {
    let empty = Snapshot::empty("s");
    let a = Snapshot::new("s", [("a", "1"), ("b", "2"), ("c", "3")]);
    let b = Snapshot::new("s", [("b", "2"), ("c", "30"), ("d", "4")]);
    let c = Snapshot::new("s", [("a", ""), ("x.y.z", "deep")]);
    vec![
        (empty.clone(), a.clone()),
        (a.clone(), empty.clone()),
        (a.clone(), b.clone()),
        (b.clone(), a.clone()),
        (a.clone(), c.clone()),
        (c, b),
        (empty.clone(), empty),
    ]
}

#[timeout(1000)]
#[test]
fn test_apply_round_trip() {
    for (before, after) in pairs() {
        let changes = ChangeSetBuilder::compare(Some(&before), Some(&after)).build();
        assert_eq!(changes.apply_to(&before).as_map(), after.as_map());
    }
}

#[timeout(1000)]
#[test]
fn test_self_diff_is_empty() {
    for (before, _) in pairs() {
        let changes = ChangeSetBuilder::compare(Some(&before), Some(&before)).build();
        assert!(changes.is_empty());
    }
}

#[timeout(1000)]
#[test]
fn test_counts_sum_to_records() {
    for (before, after) in pairs() {
        let changes = ChangeSetBuilder::compare(Some(&before), Some(&after)).build();
        assert_eq!(
            changes.added_size() + changes.removed_size() + changes.updated_size(),
            changes.len()
        );
        for record in changes.records() {
            let key = record.key();
            let hits = [changes.is_added(key), changes.is_removed(key), changes.is_updated(key)]
                .into_iter()
                .filter(|hit| *hit)
                .count();
            assert_eq!(hits, 1, "key {}", key);
        }
    }
}

#[timeout(1000)]
#[test]
fn test_empty_value_is_not_absence() {
    let before = Snapshot::new("s", [("a", "1")]);
    let after = Snapshot::new("s", [("a", "")]);
    let changes = ChangeSetBuilder::compare(Some(&before), Some(&after)).build();
    assert!(changes.is_updated("a"));
    assert_eq!(changes.record("a").unwrap().new_value(), Some(""));
}

#[timeout(1000)]
#[test]
fn test_new_and_deleted_round_trip() {
    let snapshot = Snapshot::new("s", [("a", "1"), ("b", "2")]);

    let added = ChangeSet::of_added(&snapshot);
    assert_eq!(added.change_type(), ChangeType::New);
    assert_eq!(added.apply_to(&Snapshot::empty("s")).as_map(), snapshot.as_map());

    let deleted = ChangeSet::of_deleted(&snapshot);
    assert_eq!(deleted.change_type(), ChangeType::Deleted);
    assert!(deleted.apply_to(&snapshot).is_empty());
}

#[timeout(5000)]
#[test]
fn test_change_set_shared_across_threads() {
    let before = Snapshot::new("s", [("a", "1"), ("b", "2")]);
    let after = Snapshot::new("s", [("a", "1"), ("b", "3"), ("c", "4")]);
    let changes = Arc::new(ChangeSetBuilder::compare(Some(&before), Some(&after)).build());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let changes = Arc::clone(&changes);
            thread::spawn(move || (changes.is_updated("b"), changes.is_added("c"), changes.len()))
        })
        .collect();

    for reader in readers {
        assert_eq!(reader.join().unwrap(), (true, true, 2));
    }
}

#[timeout(1000)]
#[test]
fn test_serialized_records_are_ordered() {
    let before = Snapshot::new("s", [("z", "1")]);
    let after = Snapshot::new("s", [("a", "1"), ("m", "2")]);
    let changes = ChangeSetBuilder::compare(Some(&before), Some(&after))
        .version("fixed")
        .timestamp(42)
        .build();

    let value = serde_json::to_value(&changes).unwrap();
    let keys: Vec<_> = value["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, vec!["a", "m", "z"]);
    assert_eq!(value["version"], "fixed");
    assert_eq!(value["timestamp"], 42);
}
