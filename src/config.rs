//! Configuration structures and loading logic

use crate::disk::DEFAULT_LOW_SPACE_THRESHOLD;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main manager configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Explicit cache root; resolved from the HuggingFace environment when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_root: Option<PathBuf>,
    pub low_space_threshold_bytes: u64,
    pub api_port: u16,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            cache_root: None,
            low_space_threshold_bytes: DEFAULT_LOW_SPACE_THRESHOLD,
            api_port: default_api_port(),
        }
    }
}

impl ManagerConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content).context("Failed to parse TOML config")?
        } else {
            Self::default()
        };

        if let Ok(root) = std::env::var("MODEL_CACHE_ROOT") {
            config.cache_root = Some(PathBuf::from(root));
        }
        if let Ok(threshold) = std::env::var("MODEL_CACHE_LOW_SPACE_THRESHOLD") {
            config.low_space_threshold_bytes = threshold
                .parse()
                .context("Invalid MODEL_CACHE_LOW_SPACE_THRESHOLD value")?;
        }
        if let Ok(port) = std::env::var("MODEL_CACHE_API_PORT") {
            config.api_port = port.parse().context("Invalid MODEL_CACHE_API_PORT value")?;
        }

        Ok(config)
    }

    /// Cache root to operate on
    pub fn resolved_cache_root(&self) -> PathBuf {
        self.cache_root
            .clone()
            .unwrap_or_else(crate::cache::default_cache_root)
    }

    /// Validate settings shared by every command
    pub fn validate(&self) -> Result<()> {
        if self.low_space_threshold_bytes == 0 {
            anyhow::bail!("low_space_threshold_bytes must be greater than zero");
        }

        let root = self.resolved_cache_root();
        if root.exists() && !root.is_dir() {
            anyhow::bail!("Cache root {:?} exists but is not a directory", root);
        }

        Ok(())
    }

    /// Validate settings only the HTTP server uses
    pub fn validate_api(&self) -> Result<()> {
        if self.api_port < 1024 {
            anyhow::bail!("API port must be >= 1024 (got {})", self.api_port);
        }
        Ok(())
    }
}

fn default_api_port() -> u16 {
    9000
}
