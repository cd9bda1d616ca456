//! Cartwise configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path (`--config`), or the user override at
//!    `~/.config/cartwise/config.toml` when present
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Missing keys in an override take their default values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::ingest::{Limits, DEFAULT_MAX_SHOWN};
use crate::stats::RewardsConfig;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/cartwise.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub max_issues_shown: usize,
    pub top_items: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_issues_shown: DEFAULT_MAX_SHOWN,
            top_items: 25,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rewards: RewardsConfig,
    pub limits: Limits,
    pub display: DisplayConfig,
}

/// Default user override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cartwise").join("config.toml"))
}

impl Config {
    /// Load from an explicit path, the user override, or the embedded defaults
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = match override_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::NotFound(format!(
                        "Config file {} does not exist",
                        path.display()
                    )));
                }
                debug!("Loading config from {}", path.display());
                fs::read_to_string(path)?
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!("Loading config override from {}", path.display());
                    fs::read_to_string(&path)?
                }
                None => DEFAULT_CONFIG.to_string(),
            },
        };

        Self::parse(&content)
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let rewards = &self.rewards;
        if !(1..=12).contains(&rewards.cycle_start_month) {
            return Err(Error::Config(format!(
                "rewards.cycle_start_month must be 1-12, got {}",
                rewards.cycle_start_month
            )));
        }
        if !(1..=31).contains(&rewards.cycle_start_day) {
            return Err(Error::Config(format!(
                "rewards.cycle_start_day must be 1-31, got {}",
                rewards.cycle_start_day
            )));
        }
        if self.limits.max_file_bytes == 0 || self.limits.max_total_bytes == 0 {
            return Err(Error::Config(
                "limits.max_file_bytes and limits.max_total_bytes must be positive".to_string(),
            ));
        }
        if self.display.top_items == 0 {
            return Err(Error::Config("display.top_items must be positive".to_string()));
        }
        Ok(())
    }
}
