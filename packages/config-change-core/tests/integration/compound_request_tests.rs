//! Compound change requests fanning out to several backends.

use std::fs;

use config_change_core::{ChangeError, ChangeRequestFactory, RequestState};
use ntest::timeout;
use tempfile::tempdir;

use super::helpers::{map, path_str, read_properties, read_xml};

#[timeout(1000)]
#[test]
fn test_read_write_compound() {
    let dir = tempdir().unwrap();
    let xml = dir.path().join("compound.xml");
    let flat = dir.path().join("compound.properties");
    let factory = ChangeRequestFactory::default();
    let locators = [path_str(&xml), path_str(&flat)];

    let mut request = factory.create(&locators).unwrap();
    assert!(request.is_compound());
    request.put("key1", "value1").unwrap();
    request
        .put_all([("key2", "value2"), ("key3", "value3")])
        .unwrap();
    let report = request.commit().unwrap();
    assert_eq!(report.changes.len(), 2);
    assert!(xml.exists());
    assert!(flat.exists());

    let mut second = factory.create(&locators).unwrap();
    second.remove("foo").unwrap();
    second.remove("key3").unwrap();
    second.put("key1", "value1.2").unwrap();
    second.put("key4", "value4").unwrap();
    second.commit().unwrap();

    let expected = map(&[("key1", "value1.2"), ("key2", "value2"), ("key4", "value4")]);
    assert_eq!(read_properties(&flat), expected);
    assert_eq!(read_xml(&xml), expected);
}

#[timeout(1000)]
#[test]
fn test_compound_keeps_untouched_entries_per_backend() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.properties");
    let second = dir.path().join("second.properties");
    fs::write(&first, "only.first=1\nshared=a\n").unwrap();
    fs::write(&second, "only.second=2\nshared=b\n").unwrap();

    let mut request = ChangeRequestFactory::default()
        .create(&[path_str(&first), path_str(&second)])
        .unwrap();
    request.put("shared", "c").unwrap();
    let report = request.commit().unwrap();

    assert_eq!(read_properties(&first), map(&[("only.first", "1"), ("shared", "c")]));
    assert_eq!(read_properties(&second), map(&[("only.second", "2"), ("shared", "c")]));
    assert!(report.changes.iter().all(|c| c.is_updated("shared")));
}

#[timeout(1000)]
#[test]
fn test_compound_partial_failure_keeps_persisted_backend() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.xml");
    let bad = dir.path().join("absent-dir").join("bad.properties");

    let mut request = ChangeRequestFactory::default()
        .create(&[path_str(&good), path_str(&bad)])
        .unwrap();
    request.put("k1", "v1").unwrap();
    let err = request.commit().unwrap_err();

    assert_eq!(request.state(), RequestState::Committed);
    assert!(request.is_closed());
    assert_eq!(err.locator(), Some(path_str(&bad).as_str()));
    match err {
        ChangeError::PartialCommit { committed, .. } => {
            assert_eq!(committed, vec![path_str(&good)]);
        }
        other => panic!("Expected PartialCommit, got {:?}", other),
    }
    assert_eq!(read_xml(&good), map(&[("k1", "v1")]));
    assert!(!bad.exists());
    assert_eq!(request.applied_changes().len(), 1);
}

#[timeout(1000)]
#[test]
fn test_compound_stops_at_first_failure() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("absent-dir").join("bad.properties");
    let after = dir.path().join("after.properties");

    let mut request = ChangeRequestFactory::default()
        .create(&[path_str(&bad), path_str(&after)])
        .unwrap();
    request.put("k", "v").unwrap();
    assert!(request.commit().is_err());

    assert!(!after.exists());
    assert!(request.applied_changes().is_empty());
    assert!(request.put("k", "v").unwrap_err().is_illegal_state());
}
