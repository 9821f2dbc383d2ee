//! Creates change requests for backend locators.

use crate::backend::{self, BackendAdapter, BackendFormat, Locator};
use crate::config::ChangeConfig;
use crate::error::{ChangeError, Result};
use crate::request::{ChangeRequest, ChangeRequestHandle};
use crate::snapshot::Snapshot;

/// Resolves locators to backend formats and opens change requests over them.
///
/// Locators ending in the configured XML suffix use the XML format, all
/// other file locators use the flat properties format.
#[derive(Debug, Clone, Default)]
pub struct ChangeRequestFactory {
    config: ChangeConfig,
}

impl ChangeRequestFactory {
    /// Creates a factory whose requests share `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Persistence settings applied to every backend the factory opens.
    pub fn new(config: ChangeConfig) -> Self {
        Self { config }
    }

    /// Settings shared by every request this factory opens.
    pub fn config(&self) -> &ChangeConfig {
        &self.config
    }

    /// Parses `raw` and selects its backend format.
    pub fn resolve(&self, raw: &str) -> Result<(Locator, BackendFormat)> {
        let locator = Locator::parse(raw)?;
        let format = if locator.has_suffix(&self.config.xml_suffix) {
            BackendFormat::Xml
        } else {
            BackendFormat::Properties
        };
        Ok((locator, format))
    }

    /// Opens one request covering every locator, in the given order.
    ///
    /// With more than one locator the request is compound: the same staged
    /// mutations are committed to each backend.
    pub fn create<S: AsRef<str>>(&self, locators: &[S]) -> Result<ChangeRequest> {
        if locators.is_empty() {
            return Err(ChangeError::BackendUnavailable {
                locator: String::new(),
                reason: "no backend locator given".to_string(),
            });
        }

        let resolved = locators
            .iter()
            .map(|raw| self.resolve(raw.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let backends = resolved
            .into_iter()
            .map(|(locator, format)| BackendAdapter::open(locator, format, &self.config))
            .collect();

        let request = ChangeRequest::new(backends);
        tracing::debug!(
            request = %request.id(),
            backends = locators.len(),
            "Change request opened"
        );
        Ok(request)
    }

    /// Like [`create`](Self::create), wrapped in a handle that cancels on drop.
    pub fn create_handle<S: AsRef<str>>(&self, locators: &[S]) -> Result<ChangeRequestHandle> {
        self.create(locators).map(ChangeRequestHandle::new)
    }

    /// Reads a backend's current content without opening a request.
    ///
    /// Returns `None` if the backend does not exist.
    pub fn load_snapshot(&self, raw: &str) -> Result<Option<Snapshot>> {
        let (locator, format) = self.resolve(raw)?;
        backend::read_snapshot(&locator, format)
    }
}
