//! Change request configuration.

/// Settings shared by every backend a factory opens.
#[derive(Debug, Clone)]
pub struct ChangeConfig {
    /// Locator suffix selecting the XML backend (matched case-insensitively)
    pub xml_suffix: String,
    /// Header comment written at the top of every persisted file
    pub header_comment: String,
    /// Create a missing parent directory on commit instead of failing
    pub create_parent_dirs: bool,
    /// Fsync the staged file before renaming it over the target
    pub sync_on_commit: bool,
}

impl Default for ChangeConfig {
    fn default() -> Self {
        Self {
            xml_suffix: ".xml".to_string(),
            header_comment: "Properties written by config-change".to_string(),
            create_parent_dirs: false,
            sync_on_commit: true,
        }
    }
}
