//! I/O helpers for committing backend files.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::ChangeError;

/// Maps an I/O error raised while persisting `locator` into a `ChangeError`.
pub fn classify_io_error(error: io::Error, locator: &str, context: &str) -> ChangeError {
    let kind = error.kind();
    let reason = match kind {
        io::ErrorKind::StorageFull | io::ErrorKind::OutOfMemory => {
            format!("{}: disk full: {}", context, error)
        }
        _ => format!("{}: {}", context, error),
    };
    ChangeError::Persistence {
        locator: locator.to_string(),
        kind,
        reason,
    }
}

/// Path of the staging file written next to `path` before the rename.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replaces the content of `path` by writing a sibling temp file and renaming it.
pub fn write_replace(path: &Path, contents: &[u8], sync: bool) -> io::Result<()> {
    let temp = temp_path(path);
    let result = (|| {
        let mut file = File::create(&temp)?;
        file.write_all(contents)?;
        if sync {
            file.sync_all()?;
        }
        fs::rename(&temp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}
