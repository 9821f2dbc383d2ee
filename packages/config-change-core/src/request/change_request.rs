use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::backend::{BackendAdapter, Locator};
use crate::change::ChangeSet;
use crate::error::{ChangeError, Result};

use super::mutation_buffer::MutationBuffer;

/// Lifecycle state of a change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    /// Accepting mutations
    Open,
    /// Commit was attempted (terminal)
    Committed,
    /// Discarded without touching any backend (terminal)
    Cancelled,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Open => f.write_str("open"),
            RequestState::Committed => f.write_str("committed"),
            RequestState::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Serialize)]
pub struct CommitReport {
    /// Id of the committed request
    pub request: String,
    /// One change set per persisted backend, in backend order
    pub changes: Vec<ChangeSet>,
}

/// Staged configuration changes over one or more backends.
///
/// Mutations accumulate in a [`MutationBuffer`] until [`commit`](Self::commit)
/// writes them to every backend in order, or [`cancel`](Self::cancel)
/// discards them. Both are terminal. Backends commit independently: a
/// failing backend stops the commit, but earlier backends stay persisted.
#[derive(Debug)]
pub struct ChangeRequest {
    id: String,
    buffer: MutationBuffer,
    backends: Vec<BackendAdapter>,
    state: RequestState,
    /// Change sets of the backends persisted by `commit`
    applied: Vec<ChangeSet>,
}

impl ChangeRequest {
    /// Creates an open request over `backends` with a fresh id.
    pub fn new(backends: Vec<BackendAdapter>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            buffer: MutationBuffer::new(),
            backends,
            state: RequestState::Open,
            applied: Vec::new(),
        }
    }

    /// Opaque request id, recorded in the header of persisted files.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Returns `true` once committed or cancelled.
    pub fn is_closed(&self) -> bool {
        self.state != RequestState::Open
    }

    /// Returns `true` if the request fans out to more than one backend.
    pub fn is_compound(&self) -> bool {
        self.backends.len() > 1
    }

    /// Backends in commit order.
    pub fn backends(&self) -> &[BackendAdapter] {
        &self.backends
    }

    /// Locators of the backends, in commit order.
    pub fn backend_locators(&self) -> impl Iterator<Item = &Locator> {
        self.backends.iter().map(BackendAdapter::locator)
    }

    /// Staged mutations.
    pub fn buffer(&self) -> &MutationBuffer {
        &self.buffer
    }

    /// Change sets of the backends that were persisted, including after a
    /// failed commit.
    pub fn applied_changes(&self) -> &[ChangeSet] {
        &self.applied
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state != RequestState::Open {
            return Err(ChangeError::IllegalState {
                request: self.id.clone(),
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    /// Stages `key = value` for every backend.
    ///
    /// # Arguments
    ///
    /// * `key` - Property key to set.
    /// * `value` - New value; replaces any earlier staged put or remove of `key`.
    ///
    /// # Returns
    ///
    /// `ChangeError::IllegalState` if the request is no longer open.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        self.buffer.put(key, value);
        Ok(())
    }

    /// Stages every `(key, value)` pair. Fails if the request is closed.
    pub fn put_all<I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.ensure_open()?;
        self.buffer.put_all(entries);
        Ok(())
    }

    /// Stages removal of `key`. Removing an absent key is not an error.
    pub fn remove(&mut self, key: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        self.buffer.remove(key);
        Ok(())
    }

    /// Stages removal of every key in `keys`. Fails if the request is closed.
    pub fn remove_all<I, K>(&mut self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.ensure_open()?;
        self.buffer.remove_all(keys);
        Ok(())
    }

    /// Checks the loaded backend state, not the staged mutations.
    ///
    /// `pattern` is an exact key or a regular expression matching a whole
    /// key. True if any backend reports a match.
    pub fn exists(&self, pattern: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.backends.iter().any(|backend| backend.exists(pattern)))
    }

    /// Writes the staged mutations to every backend, in order.
    ///
    /// The request is `Committed` afterwards even if a backend failed.
    /// On failure, backends after the failing one are not attempted and the
    /// error lists the locators that were already persisted.
    pub fn commit(&mut self) -> Result<CommitReport> {
        self.ensure_open()?;
        self.state = RequestState::Committed;

        tracing::debug!(
            request = %self.id,
            backends = self.backends.len(),
            operations = self.buffer.len(),
            "Committing change request"
        );

        let mut committed = Vec::with_capacity(self.backends.len());
        for backend in &mut self.backends {
            match backend.commit_internal(&self.buffer, &self.id) {
                Ok(changes) => {
                    tracing::info!(
                        request = %self.id,
                        locator = %backend.locator(),
                        changed = changes.len(),
                        "Backend persisted"
                    );
                    committed.push(backend.locator().to_string());
                    self.applied.push(changes);
                }
                Err(err) => {
                    tracing::error!(
                        request = %self.id,
                        locator = %backend.locator(),
                        error = %err,
                        "Backend commit failed"
                    );
                    return Err(ChangeError::PartialCommit {
                        failed: backend.locator().to_string(),
                        committed,
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(CommitReport {
            request: self.id.clone(),
            changes: self.applied.clone(),
        })
    }

    /// Discards the staged mutations without touching any backend.
    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.buffer.clear();
        self.state = RequestState::Cancelled;
        tracing::debug!(request = %self.id, "Change request cancelled");
        Ok(())
    }
}

impl fmt::Display for ChangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeRequest{{id={}, state={}, backends=[", self.id, self.state)?;
        for (i, backend) in self.backends.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", backend)?;
        }
        f.write_str("]}")
    }
}
