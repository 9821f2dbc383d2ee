//! File backends: locating, loading, and committing key/value files.
//!
//! A [`BackendAdapter`] is bound to one [`Locator`]. It loads the file once
//! on open and rewrites the whole file on commit. The serialization is
//! chosen by the closed [`BackendFormat`] enum.

pub mod io_utils;
mod locator;
pub mod properties_format;
pub mod xml_format;

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};

use regex::Regex;

use crate::change::{ChangeSet, ChangeSetBuilder};
use crate::config::ChangeConfig;
use crate::error::{ChangeError, Result};
use crate::request::MutationBuffer;
use crate::snapshot::Snapshot;

pub use locator::Locator;

use io_utils::{classify_io_error, write_replace};

/// Serialization of a backend file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendFormat {
    /// One `key=value` pair per line
    Properties,
    /// `<properties>` root with `<entry key="..">` children
    Xml,
}

impl BackendFormat {
    fn decode(self, bytes: &[u8]) -> std::result::Result<BTreeMap<String, String>, String> {
        match self {
            BackendFormat::Properties => {
                properties_format::decode(&properties_format::text_from_bytes(bytes))
            }
            BackendFormat::Xml => {
                let text = std::str::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {}", e))?;
                xml_format::decode(text)
            }
        }
    }

    fn encode(self, entries: &BTreeMap<String, String>, comment: &str) -> String {
        match self {
            BackendFormat::Properties => {
                let date = chrono::Local::now().to_rfc2822();
                properties_format::encode(entries, &[comment, date.as_str()])
            }
            BackendFormat::Xml => xml_format::encode(entries, comment),
        }
    }
}

impl fmt::Display for BackendFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendFormat::Properties => f.write_str("properties"),
            BackendFormat::Xml => f.write_str("xml"),
        }
    }
}

/// In-memory view of one backend file plus the means to persist it.
#[derive(Debug)]
pub struct BackendAdapter {
    locator: Locator,
    format: BackendFormat,
    /// Entries loaded on open, replaced by the merged state after commit
    entries: BTreeMap<String, String>,
    /// Whether the file existed when it was loaded
    existed: bool,
    config: ChangeConfig,
}

impl BackendAdapter {
    /// Opens a backend, loading its current content.
    ///
    /// A missing file starts out empty. A file that cannot be read or
    /// parsed is logged and also treated as empty.
    pub fn open(locator: Locator, format: BackendFormat, config: &ChangeConfig) -> Self {
        let path = locator.path();
        let existed = path.exists();
        let entries = if existed {
            match load_entries(&locator, format) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(locator = %locator, error = %err, "Backend treated as empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        tracing::debug!(
            locator = %locator,
            format = %format,
            existed,
            entries = entries.len(),
            "Backend opened"
        );
        Self {
            locator,
            format,
            entries,
            existed,
            config: config.clone(),
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn format(&self) -> BackendFormat {
        self.format
    }

    /// Whether the file existed when it was loaded.
    pub fn existed(&self) -> bool {
        self.existed
    }

    /// Current loaded state as a snapshot named after the locator.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_map(self.locator.as_str(), self.entries.clone())
    }

    /// Checks whether `pattern` names a loaded key.
    ///
    /// The pattern first matches exactly, then as a regular expression that
    /// must match a whole key. A literal key containing regex metacharacters
    /// can therefore also match other keys. An invalid expression only
    /// matches exactly.
    pub fn exists(&self, pattern: &str) -> bool {
        if self.entries.contains_key(pattern) {
            return true;
        }
        // Validate the bare pattern first so it cannot unbalance the anchoring group.
        let anchored =
            Regex::new(pattern).and_then(|_| Regex::new(&format!("^(?:{})$", pattern)));
        match anchored {
            Ok(regex) => self.entries.keys().any(|key| regex.is_match(key)),
            Err(err) => {
                tracing::debug!(pattern, error = %err, "Pattern is not a valid expression");
                false
            }
        }
    }

    /// Merges `buffer` into the loaded entries and rewrites the file.
    ///
    /// Creates the file first if it does not exist. Returns the change set
    /// between the loaded and the persisted state. The loaded state is only
    /// replaced once the write succeeded.
    pub fn commit_internal(&mut self, buffer: &MutationBuffer, request_id: &str) -> Result<ChangeSet> {
        let path = self.locator.path();
        let locator = self.locator.as_str();

        if !path.exists() {
            if self.config.create_parent_dirs {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| {
                        classify_io_error(e, locator, "Failed to create config directory")
                    })?;
                }
            }
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|e| classify_io_error(e, locator, "Failed to create config file"))?;
        }

        let mut merged = self.entries.clone();
        buffer.apply_to(&mut merged);

        let comment = format!("{}, request: {}", self.config.header_comment, request_id);
        let contents = self.format.encode(&merged, &comment);
        write_replace(path, contents.as_bytes(), self.config.sync_on_commit)
            .map_err(|e| classify_io_error(e, locator, "Failed to write config"))?;

        let baseline = self.existed.then(|| self.snapshot());
        let persisted = Snapshot::from_map(locator, merged.clone());
        let changes = ChangeSetBuilder::compare(baseline.as_ref(), Some(&persisted)).build();

        self.entries = merged;
        self.existed = true;
        Ok(changes)
    }
}

impl fmt::Display for BackendAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}BackendAdapter{{file={}}}", self.format, self.locator)
    }
}

fn load_entries(locator: &Locator, format: BackendFormat) -> Result<BTreeMap<String, String>> {
    let load_error = |reason: String| ChangeError::Load {
        locator: locator.as_str().to_string(),
        reason,
    };
    let bytes = fs::read(locator.path()).map_err(|e| load_error(e.to_string()))?;
    format.decode(&bytes).map_err(load_error)
}

/// Reads a backend without opening a change request.
///
/// Returns `None` when the file does not exist.
pub fn read_snapshot(locator: &Locator, format: BackendFormat) -> Result<Option<Snapshot>> {
    if !locator.path().exists() {
        return Ok(None);
    }
    let entries = load_entries(locator, format)?;
    Ok(Some(Snapshot::from_map(locator.as_str(), entries)))
}
