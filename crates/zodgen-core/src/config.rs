//! # Configuration
//!
//! Two roots drive everything: the directory watched for source units and
//! the directory generated files are written under. Both have fixed
//! defaults. Values are layered: defaults, then an optional YAML file, then
//! `ZODGEN_*` environment variables, then CLI flags (applied by the binary).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default directory scanned for source units.
pub const DEFAULT_WATCH_ROOT: &str = "app/zodgen/";
/// Default directory generated files are written under.
pub const DEFAULT_OUTPUT_ROOT: &str = "app/javascript/__generated__/zodgen";
/// Default source-unit extension.
pub const DEFAULT_SOURCE_EXTENSION: &str = "rb";
/// Default generated-file extension.
pub const DEFAULT_TARGET_EXTENSION: &str = "ts";
/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "zodgen.yaml";

/// Environment override for [`Config::watch_root`].
pub const ENV_WATCH_ROOT: &str = "ZODGEN_WATCH_ROOT";
/// Environment override for [`Config::output_root`].
pub const ENV_OUTPUT_ROOT: &str = "ZODGEN_OUTPUT_ROOT";
/// Environment override for [`Config::unknown_policy`].
pub const ENV_UNKNOWN_POLICY: &str = "ZODGEN_UNKNOWN_POLICY";

/// What to do when a field's type has no schema equivalent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    /// Emit `z.unknown()` without comment.
    #[default]
    Silent,
    /// Emit `z.unknown()` and log a warning naming the field.
    Warn,
}

impl std::str::FromStr for UnknownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "warn" => Ok(Self::Warn),
            other => Err(format!("unknown policy '{other}'")),
        }
    }
}

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory containing source units.
    pub watch_root: PathBuf,
    /// Directory generated files are written under.
    pub output_root: PathBuf,
    /// Extension of source units, without the dot.
    pub source_extension: String,
    /// Extension of generated files, without the dot.
    pub target_extension: String,
    /// Handling of unsupported type shapes.
    pub unknown_policy: UnknownPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_root: PathBuf::from(DEFAULT_WATCH_ROOT),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            target_extension: DEFAULT_TARGET_EXTENSION.to_string(),
            unknown_policy: UnknownPolicy::default(),
        }
    }
}

impl Config {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read and parse a YAML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    /// Load configuration: the explicit file if given, else
    /// [`DEFAULT_CONFIG_FILE`] when present, else defaults; then apply
    /// environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `ZODGEN_*` overrides read through `lookup`. Empty values are
    /// ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(watch_root) = non_empty(ENV_WATCH_ROOT) {
            self.watch_root = PathBuf::from(watch_root);
        }
        if let Some(output_root) = non_empty(ENV_OUTPUT_ROOT) {
            self.output_root = PathBuf::from(output_root);
        }
        if let Some(policy) = non_empty(ENV_UNKNOWN_POLICY) {
            self.unknown_policy =
                policy
                    .parse()
                    .map_err(|_| ConfigError::InvalidOverride {
                        variable: ENV_UNKNOWN_POLICY,
                        value: policy.clone(),
                        expected: "silent, warn",
                    })?;
        }
        Ok(self)
    }
}
