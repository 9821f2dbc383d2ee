use std::collections::{BTreeMap, BTreeSet};

/// Pending `put`/`remove` operations staged before commit.
///
/// The last operation on a key wins: a `put` cancels an earlier `remove`
/// of the same key and vice versa, so a key is never in both sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBuffer {
    /// Keys to write with their new values
    puts: BTreeMap<String, String>,
    /// Keys to delete
    removes: BTreeSet<String>,
}

impl MutationBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `key = value`, replacing any earlier put or remove of `key`.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.removes.remove(&key);
        self.puts.insert(key, value.into());
    }

    /// Stages every `(key, value)` pair, in iteration order.
    pub fn put_all<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in entries {
            self.put(key, value);
        }
    }

    /// Stages removal of `key`, replacing any earlier put of `key`.
    pub fn remove(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.puts.remove(&key);
        self.removes.insert(key);
    }

    /// Stages removal of every key in `keys`.
    pub fn remove_all<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        for key in keys {
            self.remove(key);
        }
    }

    /// Staged puts, ordered by key.
    pub fn puts(&self) -> &BTreeMap<String, String> {
        &self.puts
    }

    /// Staged removals, ordered by key.
    pub fn removes(&self) -> &BTreeSet<String> {
        &self.removes
    }

    /// Number of staged operations.
    pub fn len(&self) -> usize {
        self.puts.len() + self.removes.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.removes.is_empty()
    }

    /// Drops all staged operations.
    pub fn clear(&mut self) {
        self.puts.clear();
        self.removes.clear();
    }

    /// Merges the staged operations into `entries`.
    pub fn apply_to(&self, entries: &mut BTreeMap<String, String>) {
        for (key, value) in &self.puts {
            entries.insert(key.clone(), value.clone());
        }
        for key in &self.removes {
            entries.remove(key);
        }
    }
}
