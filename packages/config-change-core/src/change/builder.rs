use std::collections::HashMap;

use uuid::Uuid;

use crate::snapshot::Snapshot;

use super::change_set::{ChangeSet, ChangeType};
use super::record::ChangeRecord;

/// Builds a [`ChangeSet`] from two snapshots or from an explicit delta.
#[derive(Debug, Clone)]
pub struct ChangeSetBuilder {
    source: Snapshot,
    change_type: ChangeType,
    records: HashMap<String, ChangeRecord>,
    version: Option<String>,
    timestamp: Option<i64>,
}

impl ChangeSetBuilder {
    /// Classifies the difference between `baseline` and `target`.
    ///
    /// `None` as baseline means the source did not exist (`NEW`), `None`
    /// as target means it was deleted (`DELETED`). Otherwise every key of
    /// the union is compared and unchanged keys are omitted (`UPDATED`).
    /// With both sides absent the result is an empty `UPDATED` set.
    pub fn compare(baseline: Option<&Snapshot>, target: Option<&Snapshot>) -> Self {
        match (baseline, target) {
            (None, Some(target)) => Self::of(target, ChangeType::New),
            (Some(baseline), None) => Self::of(baseline, ChangeType::Deleted),
            (Some(baseline), Some(target)) => {
                let mut builder = Self::of(baseline, ChangeType::Updated);
                builder.records = diff(baseline, target);
                builder
            }
            (None, None) => Self::of(&Snapshot::empty(""), ChangeType::Updated),
        }
    }

    /// Starts a change set over `source`.
    ///
    /// `NEW` records every entry of `source` as added and `DELETED` records
    /// every entry as removed; `UPDATED` starts with no records so that an
    /// explicit delta can be supplied through [`record`](Self::record).
    pub fn of(source: &Snapshot, change_type: ChangeType) -> Self {
        let records = match change_type {
            ChangeType::New => source
                .iter()
                .map(|(k, v)| (k.to_string(), ChangeRecord::added(k, v)))
                .collect(),
            ChangeType::Deleted => source
                .iter()
                .map(|(k, v)| (k.to_string(), ChangeRecord::removed(k, v)))
                .collect(),
            ChangeType::Updated => HashMap::new(),
        };
        Self {
            source: source.clone(),
            change_type,
            records,
            version: None,
            timestamp: None,
        }
    }

    /// Adds or replaces the record for its key.
    pub fn record(mut self, record: ChangeRecord) -> Self {
        self.records.insert(record.key().to_string(), record);
        self
    }

    /// Adds or replaces several records.
    pub fn records(mut self, records: impl IntoIterator<Item = ChangeRecord>) -> Self {
        for record in records {
            self.records.insert(record.key().to_string(), record);
        }
        self
    }

    /// Uses a known version instead of a freshly generated one.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Uses an explicit timestamp (millis since epoch) instead of now.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn build(self) -> ChangeSet {
        let version = self
            .version
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        ChangeSet::from_parts(self.source, self.change_type, self.records, version, timestamp)
    }
}

/// Records for every key whose presence or value differs.
fn diff(baseline: &Snapshot, target: &Snapshot) -> HashMap<String, ChangeRecord> {
    let mut records = HashMap::new();
    for (key, old) in baseline.iter() {
        match target.get(key) {
            None => {
                records.insert(key.to_string(), ChangeRecord::removed(key, old));
            }
            Some(new) if new != old => {
                records.insert(key.to_string(), ChangeRecord::updated(key, old, new));
            }
            Some(_) => {}
        }
    }
    for (key, new) in target.iter() {
        if !baseline.contains_key(key) {
            records.insert(key.to_string(), ChangeRecord::added(key, new));
        }
    }
    records
}
