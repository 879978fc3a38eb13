//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Number of micro-steps a turn is divided into for movement integration.
pub const DEFAULT_MICRO_STEPS: u32 = 100;

/// Movement resolution settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Micro-steps per turn; speed per micro-step is warp squared over this
    pub micro_steps: u32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            micro_steps: DEFAULT_MICRO_STEPS,
        }
    }
}

/// Settings for one turn of the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub movement: MovementConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(EngineConfig::default().movement.micro_steps, 100);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());

        let config: EngineConfig =
            serde_json::from_str(r#"{"movement": {"micro_steps": 10}}"#).unwrap();
        assert_eq!(config.movement.micro_steps, 10);
    }
}
