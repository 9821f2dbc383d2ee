use std::fmt;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::error::{ChangeError, Result};

/// Identifier of a physical backend: a plain path or a `file:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    raw: String,
    path: PathBuf,
}

impl Locator {
    /// Parses a locator, resolving `file:` URIs to filesystem paths.
    ///
    /// Accepted forms are `/plain/path`, `relative/path`, `file:/path`,
    /// `file:///path` and `file://localhost/path`. Any other URI scheme is
    /// reported as `BackendUnavailable`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(unavailable(raw, "empty locator"));
        }

        let path = match scheme_of(trimmed) {
            None => PathBuf::from(trimmed),
            Some(scheme) if scheme.eq_ignore_ascii_case("file") => {
                file_uri_path(trimmed, &trimmed[scheme.len() + 1..])?
            }
            Some(scheme) => {
                return Err(unavailable(
                    trimmed,
                    &format!("unsupported scheme '{}'", scheme),
                ))
            }
        };

        Ok(Self {
            raw: trimmed.to_string(),
            path,
        })
    }

    /// Locator for a filesystem path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            raw: path.display().to_string(),
            path,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the file name ends with `suffix`, ignoring ASCII case.
    pub fn has_suffix(&self, suffix: &str) -> bool {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        !suffix.is_empty() && name.ends_with(&suffix.to_ascii_lowercase())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn unavailable(locator: &str, reason: &str) -> ChangeError {
    ChangeError::BackendUnavailable {
        locator: locator.to_string(),
        reason: reason.to_string(),
    }
}

/// URI scheme of `raw`, if it has one. Single letters are drive prefixes, not schemes.
fn scheme_of(raw: &str) -> Option<&str> {
    let colon = raw.find(':')?;
    let scheme = &raw[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (valid && scheme.len() > 1).then_some(scheme)
}

fn file_uri_path(raw: &str, rest: &str) -> Result<PathBuf> {
    let path = match rest.strip_prefix("//") {
        Some(authority_and_path) => {
            let slash = authority_and_path.find('/').unwrap_or(authority_and_path.len());
            let authority = &authority_and_path[..slash];
            if !authority.is_empty() && !authority.eq_ignore_ascii_case("localhost") {
                return Err(unavailable(
                    raw,
                    &format!("remote file host '{}' is not supported", authority),
                ));
            }
            &authority_and_path[slash..]
        }
        None => rest,
    };
    if path.is_empty() {
        return Err(unavailable(raw, "file URI without a path"));
    }
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|e| unavailable(raw, &format!("invalid percent-encoding: {}", e)))?;
    Ok(PathBuf::from(decoded.as_ref()))
}
