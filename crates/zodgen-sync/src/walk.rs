//! Sorted recursive file listing.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Every regular file under `dir` with extension `extension`, sorted.
///
/// Unreadable directories are logged and skipped. A missing `dir` yields
/// an empty list.
pub fn find_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut results = Vec::new();
    if dir.is_dir() {
        walk_inner(dir, OsStr::new(extension), &mut results);
    }
    results.sort();
    results
}

fn walk_inner(dir: &Path, extension: &OsStr, acc: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(
                dir = %dir.display(),
                error = %e,
                "failed to read directory during file walk"
            );
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            walk_inner(&path, extension, acc);
        } else if path.extension() == Some(extension) {
            acc.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("b").join("c");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(deep.join("z.rb"), b"").unwrap();
        std::fs::write(dir.path().join("a.rb"), b"").unwrap();
        std::fs::write(dir.path().join("b").join("notes.txt"), b"").unwrap();

        let files = find_files(dir.path(), "rb");
        assert_eq!(files, vec![dir.path().join("a.rb"), deep.join("z.rb")]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_files(&dir.path().join("absent"), "rb").is_empty());
    }
}
