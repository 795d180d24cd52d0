//! # Change Detection
//!
//! [`PollWatcher`] snapshots every source file under a root (modification
//! time and length) and diffs successive snapshots into a [`ChangeBatch`].
//! Any number of edits to one file between two polls collapse into a single
//! entry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;

use crate::walk::find_files;

/// Paths changed since the previous poll, each list sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeBatch {
    /// Files present before and after whose stamp changed.
    pub modified: Vec<PathBuf>,
    /// Files that appeared.
    pub added: Vec<PathBuf>,
    /// Files that disappeared.
    pub removed: Vec<PathBuf>,
}

impl ChangeBatch {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }

    /// Total number of changed paths.
    pub fn len(&self) -> usize {
        self.modified.len() + self.added.len() + self.removed.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

type Snapshot = BTreeMap<PathBuf, FileStamp>;

/// Interval-driven directory watcher.
#[derive(Debug)]
pub struct PollWatcher {
    root: PathBuf,
    extension: String,
    snapshot: Snapshot,
}

impl PollWatcher {
    /// Start watching `root` for files with `extension`. The current tree is
    /// the baseline; only later changes are reported.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let root = root.into();
        let extension = extension.into();
        let snapshot = scan(&root, &extension);
        Self {
            root,
            extension,
            snapshot,
        }
    }

    /// The watched directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rescan and report what changed since the last call.
    pub fn poll(&mut self) -> ChangeBatch {
        let current = scan(&self.root, &self.extension);
        let mut batch = ChangeBatch::default();

        for (path, stamp) in &current {
            match self.snapshot.get(path) {
                None => batch.added.push(path.clone()),
                Some(previous) if previous != stamp => batch.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        batch.removed = self
            .snapshot
            .keys()
            .filter(|path| !current.contains_key(*path))
            .cloned()
            .collect();

        if !batch.is_empty() {
            debug!(
                root = %self.root.display(),
                modified = batch.modified.len(),
                added = batch.added.len(),
                removed = batch.removed.len(),
                "detected source changes"
            );
        }
        self.snapshot = current;
        batch
    }
}

fn scan(root: &Path, extension: &str) -> Snapshot {
    find_files(root, extension)
        .into_iter()
        .filter_map(|path| {
            let metadata = std::fs::metadata(&path).ok()?;
            let stamp = FileStamp {
                modified: metadata.modified().ok(),
                len: metadata.len(),
            };
            Some((path, stamp))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_tree_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rb"), "class A; end\n").unwrap();
        let mut watcher = PollWatcher::new(dir.path(), "rb");
        assert!(watcher.poll().is_empty());
    }

    #[test]
    fn reports_added_modified_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("keep.rb");
        let edit = dir.path().join("edit.rb");
        let gone = dir.path().join("gone.rb");
        std::fs::write(&keep, "a").unwrap();
        std::fs::write(&edit, "a").unwrap();
        std::fs::write(&gone, "a").unwrap();
        let mut watcher = PollWatcher::new(dir.path(), "rb");

        let fresh = dir.path().join("sub").join("fresh.rb");
        std::fs::create_dir_all(fresh.parent().unwrap()).unwrap();
        std::fs::write(&fresh, "a").unwrap();
        std::fs::write(&edit, "a longer body").unwrap();
        std::fs::remove_file(&gone).unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "x").unwrap();

        let batch = watcher.poll();
        assert_eq!(batch.added, vec![fresh]);
        assert_eq!(batch.modified, vec![edit]);
        assert_eq!(batch.removed, vec![gone]);
        assert_eq!(batch.len(), 3);

        assert!(watcher.poll().is_empty());
    }
}
