use serde::Deserialize;

use crate::error::GameError;
use crate::types::Color;

const DEFAULT_SEARCH_DEPTH: u8 = 3;

/// Engine settings chosen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Plies searched by the computer opponent.
    pub search_depth: u8,
    /// Side played by the computer when AI is enabled.
    pub computer_color: Color,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            search_depth: DEFAULT_SEARCH_DEPTH,
            computer_color: Color::White,
        }
    }
}

impl GameConfig {
    /// Parses a JSON config; omitted fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, GameError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| GameError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.search_depth == 0 {
            return Err(GameError::InvalidConfig(
                "search_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
