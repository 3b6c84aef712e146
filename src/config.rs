//! Tunable segmentation constants.
//!
//! Defaults reproduce the dashboard's behaviour; a TOML file can override
//! any subset of them.

use serde::Deserialize;
use std::path::Path;

use crate::error::ReportError;

/// Thresholds used to cut event streams into sessions and levels.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentationConfig {
    /// Largest gap between consecutive events that still counts as one session
    pub session_gap_ms: i64,

    /// Game whose `wordsFound` counter drives level detection
    pub word_search_game: String,

    /// `wordsFound` value that closes a word-search level
    pub words_per_level: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            session_gap_ms: 120_000,
            word_search_game: "Boggle game".to_string(),
            words_per_level: 4.0,
        }
    }
}

impl SegmentationConfig {
    /// Load from a TOML file. Keys not present keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ReportError> {
        Ok(toml::from_str(content)?)
    }

    pub fn is_word_search(&self, game_name: &str) -> bool {
        game_name == self.word_search_game
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = SegmentationConfig::from_toml("session_gap_ms = 60000").unwrap();
        assert_eq!(config.session_gap_ms, 60_000);
        assert_eq!(config.word_search_game, "Boggle game");
        assert_eq!(config.words_per_level, 4.0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = SegmentationConfig::from_toml("gap = 5");
        assert!(matches!(result, Err(ReportError::Config(_))));
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = SegmentationConfig::from_toml("").unwrap();
        assert_eq!(config, SegmentationConfig::default());
    }
}
