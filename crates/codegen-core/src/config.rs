use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::CONFIG_TOML;

/// `.codegen/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub repo_name: String,
    /// Set by `codegen init` from the backend's view of the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_language: Option<String>,
}

impl Config {
    /// `org/repo`, or `None` until both halves are known.
    pub fn repo_full_name(&self) -> Option<String> {
        if self.organization_name.is_empty() || self.repo_name.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.organization_name, self.repo_name))
    }

    /// Load the config, returning defaults when the file does not exist.
    pub fn load(codegen_dir: &Path) -> Result<Self> {
        let path = codegen_dir.join(CONFIG_TOML);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn write(&self, codegen_dir: &Path) -> Result<()> {
        fs::create_dir_all(codegen_dir)?;
        let path = codegen_dir.join(CONFIG_TOML);
        let contents = toml::to_string(self).context("Failed to serialize config")?;
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }
}
