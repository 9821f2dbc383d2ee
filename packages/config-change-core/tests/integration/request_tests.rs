//! Single-backend change requests against real files.

use std::fs;

use config_change_core::{ChangeConfig, ChangeRequestFactory, RequestState};
use ntest::timeout;
use tempfile::tempdir;

use super::helpers::{map, path_str, read_properties, read_xml};

#[timeout(1000)]
#[test]
fn test_commit_creates_missing_backend() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.properties");
    let factory = ChangeRequestFactory::default();

    let mut request = factory.create(&[path_str(&path)]).unwrap();
    request.put("k1", "v1").unwrap();
    request.commit().unwrap();

    assert!(path.exists());
    assert_eq!(read_properties(&path), map(&[("k1", "v1")]));
}

#[timeout(1000)]
#[test]
fn test_read_write_properties_with_commit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.properties");
    let factory = ChangeRequestFactory::default();

    let mut request = factory.create(&[path_str(&path)]).unwrap();
    request.put("key1", "value1").unwrap();
    request
        .put_all([("key2", "value2"), ("key3", "value3")])
        .unwrap();
    request.commit().unwrap();
    assert!(request.is_closed());

    let mut second = factory.create(&[path_str(&path)]).unwrap();
    assert_ne!(second.id(), request.id());
    assert!(second.exists("key3").unwrap());
    second.remove("foo").unwrap();
    second.remove("key3").unwrap();
    second.put("key1", "value1.2").unwrap();
    second.put("key4", "value4").unwrap();
    let report = second.commit().unwrap();

    assert_eq!(
        read_properties(&path),
        map(&[("key1", "value1.2"), ("key2", "value2"), ("key4", "value4")])
    );
    let changes = &report.changes[0];
    assert!(changes.is_removed("key3"));
    assert!(changes.is_updated("key1"));
    assert!(changes.is_added("key4"));
    assert!(!changes.is_removed("foo"));
}

#[timeout(1000)]
#[test]
fn test_read_write_xml_with_commit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.xml");
    let factory = ChangeRequestFactory::default();

    let mut request = factory.create(&[format!("file://{}", path.display())]).unwrap();
    request.put("k1", "v1").unwrap();
    request.put("k3", "v3").unwrap();
    request.commit().unwrap();

    let mut second = factory.create(&[path_str(&path)]).unwrap();
    second.remove("k3").unwrap();
    second.put("k1", "v1.2").unwrap();
    second.put("k4", "v4").unwrap();
    second.commit().unwrap();

    assert_eq!(read_xml(&path), map(&[("k1", "v1.2"), ("k4", "v4")]));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains(&format!("request: {}", second.id())));
}

#[timeout(1000)]
#[test]
fn test_cancel_never_creates_backend() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.properties");

    let mut request = ChangeRequestFactory::default()
        .create(&[path_str(&path)])
        .unwrap();
    request.put("key1", "value1").unwrap();
    request
        .put_all([("key2", "value2"), ("key3", "value3")])
        .unwrap();
    request.cancel().unwrap();

    assert!(request.is_closed());
    assert_eq!(request.state(), RequestState::Cancelled);
    assert!(!path.exists());
}

#[timeout(1000)]
#[test]
fn test_cancel_leaves_existing_backend_unmodified() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.properties");
    fs::write(&path, "# untouched\na=1\n").unwrap();

    let mut request = ChangeRequestFactory::default()
        .create(&[path_str(&path)])
        .unwrap();
    request.remove("a").unwrap();
    request.cancel().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "# untouched\na=1\n");
}

#[timeout(1000)]
#[test]
fn test_put_then_remove_leaves_key_absent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.properties");
    let factory = ChangeRequestFactory::default();

    let mut request = factory.create(&[path_str(&path)]).unwrap();
    request.put("k", "v").unwrap();
    request.remove("k").unwrap();
    assert!(!request.exists("k").unwrap());
    request.commit().unwrap();

    assert!(read_properties(&path).is_empty());
}

#[timeout(1000)]
#[test]
fn test_remove_then_put_keeps_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.properties");
    fs::write(&path, "k=old\n").unwrap();

    let mut request = ChangeRequestFactory::default()
        .create(&[path_str(&path)])
        .unwrap();
    request.remove("k").unwrap();
    request.put("k", "new").unwrap();
    request.commit().unwrap();

    assert_eq!(read_properties(&path), map(&[("k", "new")]));
}

#[timeout(1000)]
#[test]
fn test_reapplying_same_mutations_is_stable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.properties");
    fs::write(&path, "a=1\nb=2\n").unwrap();
    let factory = ChangeRequestFactory::default();

    for _ in 0..2 {
        let mut request = factory.create(&[path_str(&path)]).unwrap();
        request.put("a", "10").unwrap();
        request.remove("b").unwrap();
        request.commit().unwrap();
    }

    assert_eq!(read_properties(&path), map(&[("a", "10")]));

    let mut again = factory.create(&[path_str(&path)]).unwrap();
    again.put("a", "10").unwrap();
    again.remove("b").unwrap();
    let report = again.commit().unwrap();
    assert!(report.changes[0].is_empty());
}

#[timeout(1000)]
#[test]
fn test_unreadable_backend_is_overwritten_on_commit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.xml");
    fs::write(&path, "this is not xml").unwrap();

    let mut request = ChangeRequestFactory::default()
        .create(&[path_str(&path)])
        .unwrap();
    assert!(!request.exists(".*").unwrap());
    request.put("k", "v").unwrap();
    request.commit().unwrap();

    assert_eq!(read_xml(&path), map(&[("k", "v")]));
}

#[timeout(1000)]
#[test]
fn test_header_comment_is_configurable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.properties");
    let factory = ChangeRequestFactory::new(ChangeConfig {
        header_comment: "managed by deploy".to_string(),
        sync_on_commit: false,
        ..Default::default()
    });

    let mut request = factory.create(&[path_str(&path)]).unwrap();
    request.put("k", "v").unwrap();
    request.commit().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let first_line = text.lines().next().unwrap();
    assert_eq!(first_line, format!("#managed by deploy, request: {}", request.id()));
}

#[timeout(1000)]
#[test]
fn test_load_snapshot_reads_committed_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.xml");
    let factory = ChangeRequestFactory::default();
    assert!(factory.load_snapshot(&path_str(&path)).unwrap().is_none());

    let mut request = factory.create(&[path_str(&path)]).unwrap();
    request.put("k", "v").unwrap();
    request.commit().unwrap();

    let snapshot = factory.load_snapshot(&path_str(&path)).unwrap().unwrap();
    assert_eq!(snapshot.get("k"), Some("v"));
}
