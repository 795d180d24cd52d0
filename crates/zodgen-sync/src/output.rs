//! Generated-file writes and removals.

use std::path::Path;

use crate::error::SyncError;

/// What a write did to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file did not exist.
    Generated,
    /// The file existed with different contents.
    Updated,
    /// The file already held exactly these bytes and was not touched.
    Unchanged,
}

/// Write `text` to `path` unless it already holds those bytes, creating
/// parent directories as needed.
pub fn write_if_changed(path: &Path, text: &str) -> Result<WriteOutcome, SyncError> {
    let previous = std::fs::read(path).ok();
    if previous.as_deref() == Some(text.as_bytes()) {
        return Ok(WriteOutcome::Unchanged);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SyncError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, text).map_err(|source| SyncError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(if previous.is_some() {
        WriteOutcome::Updated
    } else {
        WriteOutcome::Generated
    })
}

/// Remove `path` if present. Returns whether a file was removed.
pub fn remove_output(path: &Path) -> Result<bool, SyncError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(SyncError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_only_when_bytes_differ() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("user.ts");

        assert_eq!(write_if_changed(&path, "a\n").unwrap(), WriteOutcome::Generated);
        assert_eq!(write_if_changed(&path, "a\n").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(write_if_changed(&path, "b\n").unwrap(), WriteOutcome::Updated);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b\n");
    }

    #[test]
    fn removing_a_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.ts");
        assert!(!remove_output(&path).unwrap());
        std::fs::write(&path, "x").unwrap();
        assert!(remove_output(&path).unwrap());
        assert!(!path.exists());
    }
}
