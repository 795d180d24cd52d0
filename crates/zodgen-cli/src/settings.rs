//! # Shared Options
//!
//! Configuration is layered: the YAML file (explicit `--config`, else
//! `zodgen.yaml` when present, else built-in defaults), then `ZODGEN_*`
//! environment variables, then these flags.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use zodgen_core::{Config, UnknownPolicy};
use zodgen_extract::JsonRegistry;
use zodgen_sync::FrontEnd;

/// Options that override configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory containing source units.
    #[arg(long, global = true)]
    pub watch_root: Option<PathBuf>,

    /// Directory generated modules are written under.
    #[arg(long, global = true)]
    pub output_root: Option<PathBuf>,

    /// Handling of types without a schema equivalent (silent, warn).
    #[arg(long, global = true)]
    pub unknown_policy: Option<UnknownPolicy>,
}

impl ConfigArgs {
    /// Load configuration and apply flag overrides.
    pub fn resolve(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref()).context("failed to load configuration")?;
        if let Some(watch_root) = &self.watch_root {
            config.watch_root = watch_root.clone();
        }
        if let Some(output_root) = &self.output_root {
            config.output_root = output_root.clone();
        }
        if let Some(policy) = self.unknown_policy {
            config.unknown_policy = policy;
        }
        tracing::debug!(
            watch_root = %config.watch_root.display(),
            output_root = %config.output_root.display(),
            "resolved configuration"
        );
        Ok(config)
    }
}

/// Front-end selection shared by the compiling subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct FrontEndArgs {
    /// Take declaration shapes from a reflection registry (JSON) instead of
    /// parsing source text.
    #[arg(long, value_name = "REGISTRY")]
    pub reflect: Option<PathBuf>,
}

impl FrontEndArgs {
    /// The selected front end, loading the registry if one was given.
    pub fn front_end(&self) -> Result<FrontEnd> {
        match &self.reflect {
            None => Ok(FrontEnd::Static),
            Some(path) => load_registry(path),
        }
    }
}

fn load_registry(path: &Path) -> Result<FrontEnd> {
    let registry = JsonRegistry::from_file(path)
        .with_context(|| format!("failed to load reflection registry: {}", path.display()))?;
    tracing::info!(registry = %path.display(), types = registry.len(), "loaded reflection registry");
    Ok(FrontEnd::Reflective(Arc::new(registry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("zodgen.yaml");
        std::fs::write(&file, "watch_root: from-file\noutput_root: out-file\n").unwrap();

        let args = ConfigArgs {
            config: Some(file),
            output_root: Some(PathBuf::from("out-flag")),
            unknown_policy: Some(UnknownPolicy::Warn),
            ..ConfigArgs::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.output_root, PathBuf::from("out-flag"));
        assert_eq!(config.unknown_policy, UnknownPolicy::Warn);
    }

    #[test]
    fn missing_registry_is_an_error() {
        let args = FrontEndArgs {
            reflect: Some(PathBuf::from("/nonexistent/registry.json")),
        };
        assert!(args.front_end().is_err());
    }

    #[test]
    fn default_front_end_is_static() {
        assert!(matches!(FrontEndArgs::default().front_end().unwrap(), FrontEnd::Static));
    }
}
