//! Change request error types.

use std::io;

use thiserror::Error;

/// Errors raised while opening, staging or committing configuration changes.
#[derive(Error, Debug, Clone)]
pub enum ChangeError {
    /// Locator cannot be resolved to a known backend variant
    #[error("Backend '{locator}' unavailable: {reason}")]
    BackendUnavailable { locator: String, reason: String },

    /// I/O failure while creating or writing a backend during commit
    #[error("Failed to persist '{locator}': {reason}")]
    Persistence {
        locator: String,
        kind: io::ErrorKind,
        reason: String,
    },

    /// I/O or format failure while reading an existing backend
    #[error("Failed to load '{locator}': {reason}")]
    Load { locator: String, reason: String },

    /// Operation attempted on a request that is no longer open
    #[error("Change request {request} is {state}")]
    IllegalState { request: String, state: String },

    /// One backend of a commit failed; earlier backends stay persisted
    #[error("Commit failed on '{failed}' after persisting {} backend(s): {source}", .committed.len())]
    PartialCommit {
        failed: String,
        committed: Vec<String>,
        #[source]
        source: Box<ChangeError>,
    },
}

/// Result alias for change operations.
pub type Result<T> = std::result::Result<T, ChangeError>;

impl ChangeError {
    /// Returns `true` for errors caused by using a closed request.
    pub fn is_illegal_state(&self) -> bool {
        matches!(self, ChangeError::IllegalState { .. })
    }

    /// Locator of the backend the error refers to, if any.
    pub fn locator(&self) -> Option<&str> {
        match self {
            ChangeError::BackendUnavailable { locator, .. }
            | ChangeError::Persistence { locator, .. }
            | ChangeError::Load { locator, .. } => Some(locator),
            ChangeError::PartialCommit { failed, .. } => Some(failed),
            ChangeError::IllegalState { .. } => None,
        }
    }
}
