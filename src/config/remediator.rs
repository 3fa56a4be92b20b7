use serde::Deserialize;
use serde::Serialize;

use crate::constants::APPLY_SET_PART_OF_LABEL;
use crate::constants::DEFAULT_RESYNC_PERIOD_SECS;
use crate::constants::DEFAULT_SYNC_NAME;
use crate::constants::DEFAULT_SYNC_SCOPE;
use crate::Error;
use crate::Result;

/// Identity and cadence of the reconciler process that owns the remediator.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RemediatorConfig {
    /// Name of the sync this reconciler serves
    #[serde(default = "default_sync_name")]
    pub sync_name: String,

    /// Scope of the reconciler process (`:root` or a namespace)
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Cadence of the outer reconciliation pass (unit: seconds)
    #[serde(default = "default_resync_period_secs")]
    pub resync_period_secs: u64,
}

impl Default for RemediatorConfig {
    fn default() -> Self {
        Self {
            sync_name: default_sync_name(),
            scope: default_scope(),
            resync_period_secs: default_resync_period_secs(),
        }
    }
}

impl RemediatorConfig {
    /// Validates reconciler identity
    /// # Errors
    /// Returns `Error::InvalidConfig` when the sync name or scope is empty.
    pub fn validate(&self) -> Result<()> {
        if self.sync_name.is_empty() {
            return Err(Error::InvalidConfig("sync_name cannot be empty".into()));
        }
        if self.scope.is_empty() {
            return Err(Error::InvalidConfig("scope cannot be empty".into()));
        }
        if self.resync_period_secs == 0 {
            return Err(Error::InvalidConfig("resync_period_secs cannot be 0".into()));
        }
        Ok(())
    }

    /// Selector restricting watches to objects applied by this reconciler.
    pub fn label_selector(&self) -> String {
        format!("{}={}.{}", APPLY_SET_PART_OF_LABEL, self.sync_name, self.scope)
    }
}

fn default_sync_name() -> String {
    DEFAULT_SYNC_NAME.to_string()
}

fn default_scope() -> String {
    DEFAULT_SYNC_SCOPE.to_string()
}

fn default_resync_period_secs() -> u64 {
    DEFAULT_RESYNC_PERIOD_SECS
}
