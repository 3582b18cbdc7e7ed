//! Infrastructure implementation of the `ConfigStore` port.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::ports::ConfigStore;
use crate::domain::config::RenewerConfig;

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "CERTRENEWER_CONFIG";

/// Production implementation of `ConfigStore` that uses a YAML file on disk.
///
/// Lookup order: explicit path, `$CERTRENEWER_CONFIG`,
/// `~/.certrenewer/config.yaml`.
pub struct YamlConfigStore {
    explicit: Option<PathBuf>,
}

impl YamlConfigStore {
    #[must_use]
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self { explicit }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<RenewerConfig> {
        let path = self.path()?;
        if !path.exists() {
            return Ok(RenewerConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config: RenewerConfig = if content.trim().is_empty() {
            RenewerConfig::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("cannot parse {}", path.display()))?
        };
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.explicit {
            return Ok(path.clone());
        }
        if let Ok(val) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".certrenewer").join("config.yaml"))
    }
}
