//! Classified change sets between configuration snapshots.

mod builder;
mod change_set;
mod record;

pub use builder::ChangeSetBuilder;
pub use change_set::{ChangeSet, ChangeType};
pub use record::ChangeRecord;
