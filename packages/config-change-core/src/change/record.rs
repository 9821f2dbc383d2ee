use serde::{Deserialize, Serialize};

/// Transition of a single key between two snapshots.
///
/// At least one of the two values is always set; the classification
/// (added, removed, updated) is derived from which ones are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct ChangeRecord {
    key: String,
    old_value: Option<String>,
    new_value: Option<String>,
}

impl ChangeRecord {
    /// Creates a record, or `None` when neither value is set.
    pub fn new(
        key: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Option<Self> {
        if old_value.is_none() && new_value.is_none() {
            return None;
        }
        Some(Self {
            key: key.into(),
            old_value,
            new_value,
        })
    }

    /// Key that did not exist before.
    pub fn added(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            old_value: None,
            new_value: Some(value.into()),
        }
    }

    /// Key that no longer exists.
    pub fn removed(key: impl Into<String>, old_value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            old_value: Some(old_value.into()),
            new_value: None,
        }
    }

    /// Key whose value changed.
    pub fn updated(
        key: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            old_value: Some(old_value.into()),
            new_value: Some(new_value.into()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn old_value(&self) -> Option<&str> {
        self.old_value.as_deref()
    }

    pub fn new_value(&self) -> Option<&str> {
        self.new_value.as_deref()
    }

    pub fn is_added(&self) -> bool {
        self.old_value.is_none() && self.new_value.is_some()
    }

    pub fn is_removed(&self) -> bool {
        self.old_value.is_some() && self.new_value.is_none()
    }

    pub fn is_updated(&self) -> bool {
        self.old_value.is_some() && self.new_value.is_some()
    }
}

#[derive(Deserialize)]
struct RawRecord {
    key: String,
    old_value: Option<String>,
    new_value: Option<String>,
}

impl TryFrom<RawRecord> for ChangeRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let key = raw.key;
        ChangeRecord::new(key.clone(), raw.old_value, raw.new_value)
            .ok_or_else(|| format!("change record '{}' has neither an old nor a new value", key))
    }
}
