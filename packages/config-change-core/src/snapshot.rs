//! Immutable key/value snapshots and an atomically swappable snapshot cell.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::change::{ChangeSet, ChangeSetBuilder};

/// Point-in-time view of a configuration backend.
///
/// Entries live behind an `Arc`, so clones are cheap and share storage.
/// A snapshot is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Identity of the source this snapshot was taken from
    name: String,
    /// Key/value entries ordered by key
    entries: Arc<BTreeMap<String, String>>,
}

impl Snapshot {
    /// Creates a snapshot from any iterator of key/value pairs.
    ///
    /// Later pairs win when a key repeats.
    pub fn new<N, I, K, V>(name: N, entries: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            name: name.into(),
            entries: Arc::new(entries),
        }
    }

    /// Creates a snapshot with no entries.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Arc::new(BTreeMap::new()),
        }
    }

    pub(crate) fn from_map(name: impl Into<String>, entries: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            entries: Arc::new(entries),
        }
    }

    /// Identity of the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Borrows the underlying ordered map.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot{{name={}, entries={}}}", self.name, self.entries.len())
    }
}

/// Holds the current snapshot of a source for lock-free readers.
///
/// Writers swap in a new snapshot and receive the classified change set
/// between the previous and the new state.
#[derive(Debug)]
pub struct SnapshotCell {
    current: ArcSwap<Snapshot>,
}

impl SnapshotCell {
    /// Creates a cell holding `initial`.
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: ArcSwap::new(Arc::new(initial)),
        }
    }

    /// Loads the current snapshot.
    ///
    /// # Performance
    /// - O(1), no locking
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Atomically installs `next` and returns the changes since the previous snapshot.
    pub fn replace(&self, next: Snapshot) -> ChangeSet {
        let next = Arc::new(next);
        let previous = self.current.swap(Arc::clone(&next));
        let changes = ChangeSetBuilder::compare(Some(&previous), Some(&next)).build();
        tracing::debug!(
            source = next.name(),
            added = changes.added_size(),
            removed = changes.removed_size(),
            updated = changes.updated_size(),
            "Snapshot replaced"
        );
        changes
    }
}
