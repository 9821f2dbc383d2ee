//! Staged mutations and the commit/cancel state machine.

mod change_request;
mod mutation_buffer;
mod request_handle;

pub use change_request::{ChangeRequest, CommitReport, RequestState};
pub use mutation_buffer::MutationBuffer;
pub use request_handle::ChangeRequestHandle;
