use crate::consts::{MAX_VERSION, MIN_VERSION};
use crate::error::{BotError, Result};

use serde::{Deserialize, Serialize};

/// Settings of one bot instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// The absolute seat the bot plays, in `0..4`.
    pub player_id: u8,
    /// Observation encoding version, defaults to the latest.
    #[serde(default = "default_version")]
    pub version: u32,
}

const fn default_version() -> u32 {
    MAX_VERSION
}

impl BotConfig {
    #[must_use]
    pub const fn new(player_id: u8, version: u32) -> Self {
        Self { player_id, version }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.player_id >= 4 {
            return Err(BotError::InvalidPlayerId(self.player_id));
        }
        if self.version < MIN_VERSION || self.version > MAX_VERSION {
            return Err(BotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}
