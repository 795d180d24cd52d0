//! # Output Path Resolution
//!
//! Maps a source unit's path to the path of its generated file: the
//! watch-root prefix (and anything before it, such as a project root) is
//! stripped, the extension is swapped, and the remainder is re-rooted under
//! the output root with intermediate directories preserved.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::config::Config;

/// Source path to output path mapping for one configuration.
#[derive(Debug, Clone)]
pub struct OutputPathResolver {
    watch_components: Vec<String>,
    output_root: PathBuf,
    source_extension: String,
    target_extension: String,
}

impl OutputPathResolver {
    /// Build a resolver from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            watch_components: normal_components(&config.watch_root),
            output_root: config.output_root.clone(),
            source_extension: config.source_extension.clone(),
            target_extension: config.target_extension.clone(),
        }
    }

    /// The output root this resolver writes under.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Whether `path` carries the source extension.
    pub fn is_source(&self, path: &Path) -> bool {
        path.extension() == Some(OsStr::new(&self.source_extension))
    }

    /// Whether `path` carries the generated-file extension.
    pub fn is_output(&self, path: &Path) -> bool {
        path.extension() == Some(OsStr::new(&self.target_extension))
    }

    /// Map a source path to its output path.
    ///
    /// The last occurrence of the watch root's components inside `source`
    /// marks where the relative part begins, so `app/types/user.rb` and
    /// `/srv/project/app/types/user.rb` map identically. A path outside the
    /// watch root keeps all of its normal components.
    pub fn resolve(&self, source: &Path) -> PathBuf {
        let components = normal_components(source);
        let relative = match self.watch_prefix_end(&components) {
            Some(end) => &components[end..],
            None => &components[..],
        };

        let mut output = self.output_root.clone();
        for component in relative {
            output.push(component);
        }
        output.set_extension(&self.target_extension);
        output
    }

    fn watch_prefix_end(&self, components: &[String]) -> Option<usize> {
        let width = self.watch_components.len();
        if width == 0 || components.len() <= width {
            return None;
        }
        (0..components.len() - width)
            .rev()
            .find(|&start| components[start..start + width] == self.watch_components[..])
            .map(|start| start + width)
    }
}

/// Normal path components as strings; root, prefix, `.` and `..` are dropped
/// so a resolved path can never escape the output root.
fn normal_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
