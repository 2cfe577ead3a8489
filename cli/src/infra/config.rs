//! Infrastructure implementation of the `ConfigStore` port.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::application::ports::ConfigStore;
use crate::domain::config::{DEFAULT_CONFIG_FILE, DeployerConfig, validate_config};

/// Production implementation of `ConfigStore` that reads a YAML file on disk.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    /// Store reading `path`, or `./deploy.yaml` when `None`.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<DeployerConfig> {
        let path = &self.path;
        if !path.exists() {
            anyhow::bail!(
                "deployer file not found: {}\n\nCreate it, or pass --config <path>.",
                path.display()
            );
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config: DeployerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        validate_config(&config).with_context(|| format!("invalid {}", path.display()))?;
        tracing::debug!(path = %path.display(), deployer = %config.name, "deployer file loaded");
        Ok(config)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
