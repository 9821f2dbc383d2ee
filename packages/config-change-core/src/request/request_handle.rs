use crate::error::Result;

use super::change_request::{ChangeRequest, CommitReport};

/// RAII guard that cancels its request on drop unless it was closed explicitly.
#[derive(Debug)]
pub struct ChangeRequestHandle {
    pub(crate) request: ChangeRequest,
}

impl ChangeRequestHandle {
    /// Wraps `request`; it is cancelled on drop unless committed or cancelled first.
    pub fn new(request: ChangeRequest) -> Self {
        Self { request }
    }

    /// Gets a reference to the underlying request.
    pub fn request(&self) -> &ChangeRequest {
        &self.request
    }

    /// Gets a mutable reference to the underlying request for staging.
    pub fn request_mut(&mut self) -> &mut ChangeRequest {
        &mut self.request
    }

    /// Commits the request.
    pub fn commit(mut self) -> Result<CommitReport> {
        self.request.commit()
    }

    /// Cancels the request.
    pub fn cancel(mut self) -> Result<()> {
        self.request.cancel()
    }
}

impl Drop for ChangeRequestHandle {
    fn drop(&mut self) {
        if !self.request.is_closed() {
            tracing::debug!(request = %self.request.id(), "Dropping open change request");
            let _ = self.request.cancel();
        }
    }
}
