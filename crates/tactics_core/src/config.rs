//! Engine configuration passed to the turn controller at construction.

use serde::{Deserialize, Serialize};

use crate::data::Ruleset;
use crate::error::{GameError, Result};
use crate::production::DEFAULT_MAX_QUEUE_LEN;

/// Default delay presenters wait before running an AI turn.
pub const DEFAULT_AI_TURN_DELAY_MS: u64 = 600;

/// Everything the engine needs besides the map and the players.
///
/// # Example RON
///
/// ```ron
/// EngineConfig(
///     max_queue_len: 3,
///     reveal_map: true,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rule tables.
    #[serde(default)]
    pub ruleset: Ruleset,

    /// Maximum entries per production queue.
    #[serde(default = "default_max_queue_len")]
    pub max_queue_len: usize,

    /// Presenter hint: pause before an AI turn is shown. The engine itself
    /// never sleeps.
    #[serde(default = "default_ai_turn_delay_ms")]
    pub ai_turn_delay_ms: u64,

    /// Reveal the whole map to every player.
    #[serde(default)]
    pub reveal_map: bool,
}

const fn default_max_queue_len() -> usize {
    DEFAULT_MAX_QUEUE_LEN
}

const fn default_ai_turn_delay_ms() -> u64 {
    DEFAULT_AI_TURN_DELAY_MS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ruleset: Ruleset::default(),
            max_queue_len: DEFAULT_MAX_QUEUE_LEN,
            ai_turn_delay_ms: DEFAULT_AI_TURN_DELAY_MS,
            reveal_map: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from RON.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|source| GameError::DataParseError {
            what: "engine config",
            source,
        })?;
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(GameError::InvalidRuleset(errors.join("; ")))
        }
    }

    /// Validate the configuration and its ruleset.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.ruleset.validate();
        if self.max_queue_len == 0 {
            errors.push("max_queue_len must be at least 1".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_queue_len, 5);
        assert_eq!(config.ai_turn_delay_ms, 600);
        assert!(!config.reveal_map);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_ron() {
        let config = EngineConfig::from_ron_str("(max_queue_len: 3, reveal_map: true)").unwrap();
        assert_eq!(config.max_queue_len, 3);
        assert!(config.reveal_map);
        assert_eq!(config.ruleset, Ruleset::default());
    }

    #[test]
    fn test_zero_queue_rejected() {
        assert!(matches!(
            EngineConfig::from_ron_str("(max_queue_len: 0)"),
            Err(GameError::InvalidRuleset(_))
        ));
    }
}
