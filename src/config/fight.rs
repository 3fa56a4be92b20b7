use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_FIGHT_COOLDOWN_MS;
use crate::constants::DEFAULT_FIGHT_THRESHOLD;
use crate::constants::DEFAULT_FIGHT_WINDOW_MS;
use crate::Error;
use crate::Result;

/// Tuning for the fight detector. The defaults classify more than 5 writes
/// to one object within 1 second as a fight and retract the condition after
/// 10 quiet seconds.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct FightConfig {
    /// Sliding window over which writes are counted (unit: milliseconds)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Writes within the window beyond which the object is fighting
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Quiet period before a fighting object settles (unit: milliseconds)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl Default for FightConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            threshold: default_threshold(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl FightConfig {
    /// Validates detection thresholds
    /// # Errors
    /// Returns `Error::InvalidConfig` when the window, threshold or cooldown
    /// is zero, which would classify every write as a fight or never retract
    /// one.
    pub fn validate(&self) -> Result<()> {
        if self.window_ms == 0 {
            return Err(Error::InvalidConfig("fight window_ms cannot be 0".into()));
        }
        if self.threshold == 0 {
            return Err(Error::InvalidConfig("fight threshold cannot be 0".into()));
        }
        if self.cooldown_ms == 0 {
            return Err(Error::InvalidConfig("fight cooldown_ms cannot be 0".into()));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

fn default_window_ms() -> u64 {
    DEFAULT_FIGHT_WINDOW_MS
}

fn default_threshold() -> usize {
    DEFAULT_FIGHT_THRESHOLD
}

fn default_cooldown_ms() -> u64 {
    DEFAULT_FIGHT_COOLDOWN_MS
}
