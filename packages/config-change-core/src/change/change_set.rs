use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

use super::builder::ChangeSetBuilder;
use super::record::ChangeRecord;

/// Overall kind of change a change set describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// The source did not exist before
    New,
    /// The source no longer exists
    Deleted,
    /// The source exists on both sides
    Updated,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeType::New => "NEW",
            ChangeType::Deleted => "DELETED",
            ChangeType::Updated => "UPDATED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counts {
    added: usize,
    removed: usize,
    updated: usize,
}

/// Immutable, classified difference between two snapshots.
///
/// Built through [`ChangeSetBuilder`]. Every query is a single map lookup
/// or a precomputed count, and unknown keys simply report `false`.
/// The version token is opaque and only meant for optimistic-lock
/// comparison by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ChangeSetData", from = "ChangeSetData")]
pub struct ChangeSet {
    source: Snapshot,
    change_type: ChangeType,
    records: HashMap<String, ChangeRecord>,
    version: String,
    timestamp: i64,
    counts: Counts,
}

impl ChangeSet {
    pub(super) fn from_parts(
        source: Snapshot,
        change_type: ChangeType,
        records: HashMap<String, ChangeRecord>,
        version: String,
        timestamp: i64,
    ) -> Self {
        let mut counts = Counts::default();
        for record in records.values() {
            if record.is_added() {
                counts.added += 1;
            } else if record.is_removed() {
                counts.removed += 1;
            } else {
                counts.updated += 1;
            }
        }
        Self {
            source,
            change_type,
            records,
            version,
            timestamp,
            counts,
        }
    }

    /// Change set for a source that was just added: every entry is an addition.
    pub fn of_added(source: &Snapshot) -> Self {
        ChangeSetBuilder::compare(None, Some(source)).build()
    }

    /// Change set for a source that was deleted: every entry is a removal.
    pub fn of_deleted(source: &Snapshot) -> Self {
        ChangeSetBuilder::compare(Some(source), None).build()
    }

    /// Snapshot the change set was computed from.
    pub fn source(&self) -> &Snapshot {
        &self.source
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    /// Opaque version token.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Record for `key`, if the key changed.
    pub fn record(&self, key: &str) -> Option<&ChangeRecord> {
        self.records.get(key)
    }

    /// Iterates the records in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn added_size(&self) -> usize {
        self.counts.added
    }

    pub fn removed_size(&self) -> usize {
        self.counts.removed
    }

    pub fn updated_size(&self) -> usize {
        self.counts.updated
    }

    pub fn is_added(&self, key: &str) -> bool {
        self.records.get(key).is_some_and(ChangeRecord::is_added)
    }

    pub fn is_removed(&self, key: &str) -> bool {
        self.records.get(key).is_some_and(ChangeRecord::is_removed)
    }

    pub fn is_updated(&self, key: &str) -> bool {
        self.records.get(key).is_some_and(ChangeRecord::is_updated)
    }

    /// Returns `true` if `key` was added or updated, but not removed.
    pub fn is_key_affected(&self, key: &str) -> bool {
        self.records
            .get(key)
            .is_some_and(|record| record.new_value().is_some())
    }

    /// Replays the records onto `base`, producing the target state.
    ///
    /// For a change set computed from `a` to `b`, `apply_to(a)` has the
    /// same entries as `b`.
    pub fn apply_to(&self, base: &Snapshot) -> Snapshot {
        let mut entries = base.as_map().clone();
        for record in self.records.values() {
            match record.new_value() {
                Some(value) => {
                    entries.insert(record.key().to_string(), value.to_string());
                }
                None => {
                    entries.remove(record.key());
                }
            }
        }
        Snapshot::from_map(base.name(), entries)
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChangeSet{{type={}, source={}, version={}, timestamp={}, added={}, removed={}, updated={}}}",
            self.change_type,
            self.source.name(),
            self.version,
            self.timestamp,
            self.counts.added,
            self.counts.removed,
            self.counts.updated
        )
    }
}

/// Serialized form: records ordered by key, counts recomputed on load.
#[derive(Serialize, Deserialize)]
struct ChangeSetData {
    source: Snapshot,
    change_type: ChangeType,
    version: String,
    timestamp: i64,
    records: Vec<ChangeRecord>,
}

impl From<ChangeSet> for ChangeSetData {
    fn from(set: ChangeSet) -> Self {
        let ordered: BTreeMap<String, ChangeRecord> = set.records.into_iter().collect();
        Self {
            source: set.source,
            change_type: set.change_type,
            version: set.version,
            timestamp: set.timestamp,
            records: ordered.into_values().collect(),
        }
    }
}

impl From<ChangeSetData> for ChangeSet {
    fn from(data: ChangeSetData) -> Self {
        let records = data
            .records
            .into_iter()
            .map(|record| (record.key().to_string(), record))
            .collect();
        ChangeSet::from_parts(
            data.source,
            data.change_type,
            records,
            data.version,
            data.timestamp,
        )
    }
}
