//! Configuration management module for the remediation core.
//!
//! Provides layered configuration loading from multiple sources with priority:
//! 1. Default values (hardcoded)
//! 2. Explicit config file
//! 3. `CONFIG_PATH` config file
//! 4. Environment variables (highest priority)
//!

mod fight;
mod remediator;
pub use fight::*;
pub use remediator::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Reconciler identity and resync cadence
    #[serde(default)]
    pub remediator: RemediatorConfig,
    /// Fight detection thresholds
    #[serde(default)]
    pub fight: FightConfig,
}

impl Settings {
    /// Load configuration from multiple sources with priority:
    /// 1. Explicit config file
    /// 2. `CONFIG_PATH` config file
    /// 3. Environment variables
    ///
    /// # Arguments
    /// * `path` - Optional path to a TOML config file
    ///
    /// # Returns
    /// Merged and validated configuration
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        // 1. Explicit config file
        if let Some(path) = path {
            config = config.add_source(File::with_name(path).required(true));
        }

        // 2. Deployment overlay
        if let Ok(path) = env::var("CONFIG_PATH") {
            config = config.add_source(File::with_name(&path));
        }

        // 3. Environment variables (highest priority)
        config = config.add_source(
            Environment::with_prefix("DRIFTGUARD")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = config.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.remediator.validate()?;
        self.fight.validate()
    }
}
