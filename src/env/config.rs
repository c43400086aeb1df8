use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::RulesConfig;

pub const DEFAULT_HAND_SLOTS: usize = 10;
pub const DEFAULT_LAND_SLOTS: usize = 12;
pub const DEFAULT_CREATURE_SLOTS: usize = 10;
/// Attack subsets are `u32` bitmasks; 16 slots keeps the id space at 2^16.
pub const MAX_CREATURE_SLOTS: usize = 16;
pub const MAX_HAND_SLOTS: usize = 64;
pub const MAX_LAND_SLOTS: usize = 64;

/// Bounds every slot count so the action-id space stays small and its
/// offsets cannot overflow.
pub fn check_slots(
    hand_slots: usize,
    land_slots: usize,
    creature_slots: usize,
) -> Result<(), ConfigError> {
    if hand_slots > MAX_HAND_SLOTS {
        return Err(ConfigError::HandSlotsOutOfRange {
            value: hand_slots,
            max: MAX_HAND_SLOTS,
        });
    }
    if land_slots > MAX_LAND_SLOTS {
        return Err(ConfigError::LandSlotsOutOfRange {
            value: land_slots,
            max: MAX_LAND_SLOTS,
        });
    }
    if creature_slots == 0 || creature_slots > MAX_CREATURE_SLOTS {
        return Err(ConfigError::CreatureSlotsOutOfRange {
            value: creature_slots,
            max: MAX_CREATURE_SLOTS,
        });
    }
    Ok(())
}

/// Environment settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnvConfig {
    pub seed: u64,
    pub hand_slots: usize,
    pub land_slots: usize,
    pub creature_slots: usize,
    pub rules: RulesConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            hand_slots: DEFAULT_HAND_SLOTS,
            land_slots: DEFAULT_LAND_SLOTS,
            creature_slots: DEFAULT_CREATURE_SLOTS,
            rules: RulesConfig::default(),
        }
    }
}

impl EnvConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|error| ConfigError::Parse {
            message: error.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_slots(self.hand_slots, self.land_slots, self.creature_slots)?;
        if self.rules.max_hand_size == 0 {
            return Err(ConfigError::ZeroHandLimit);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ConfigError {
    Parse { message: String },
    HandSlotsOutOfRange { value: usize, max: usize },
    LandSlotsOutOfRange { value: usize, max: usize },
    CreatureSlotsOutOfRange { value: usize, max: usize },
    ZeroHandLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse { message } => write!(f, "invalid config json: {message}"),
            ConfigError::HandSlotsOutOfRange { value, max } => {
                write!(f, "hand_slots must be at most {max}, got {value}")
            }
            ConfigError::LandSlotsOutOfRange { value, max } => {
                write!(f, "land_slots must be at most {max}, got {value}")
            }
            ConfigError::CreatureSlotsOutOfRange { value, max } => {
                write!(f, "creature_slots must be between 1 and {max}, got {value}")
            }
            ConfigError::ZeroHandLimit => write!(f, "max_hand_size must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}
