//! Classified configuration change sets and transactional change requests.
//!
//! Computes immutable diffs between key/value snapshots, and stages
//! `put`/`remove` mutations that are committed to one or more file
//! backends (flat `.properties` or structured `.xml`).

pub mod backend;
pub mod change;
pub mod config;
pub mod error;
pub mod factory;
pub mod request;
pub mod snapshot;

pub use change::{ChangeRecord, ChangeSet, ChangeSetBuilder, ChangeType};
pub use config::ChangeConfig;
pub use error::{ChangeError, Result};
pub use factory::ChangeRequestFactory;
pub use request::{ChangeRequest, ChangeRequestHandle, CommitReport, MutationBuffer, RequestState};
pub use snapshot::{Snapshot, SnapshotCell};
