//! Engine configuration

use crate::error::ConfigError;
use crate::normalize::DEFAULT_COMMENT_MARKER;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Accuracy points removed per failed submission
pub const DEFAULT_FAILURE_PENALTY: u8 = 10;

/// Reward for missions that do not author their own
pub const DEFAULT_REWARD: u32 = 100;

/// Artificial evaluation latency used for feedback pacing
pub const DEFAULT_FEEDBACK_DELAY_MS: u64 = 1200;

/// Engine configuration
///
/// Every field is optional in TOML; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Accuracy penalty per failed submission
    pub failure_penalty: u8,
    /// Reward applied when a mission has none
    pub default_reward: u32,
    /// Minimum evaluation duration in milliseconds (0 disables pacing)
    pub feedback_delay_ms: u64,
    /// Single-line comment marker stripped by strict normalization
    ///
    /// Empty disables comment stripping; whitespace-only markers are invalid.
    pub comment_marker: String,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With failure penalty
    #[inline]
    #[must_use]
    pub fn with_failure_penalty(mut self, penalty: u8) -> Self {
        self.failure_penalty = penalty;
        self
    }

    /// With default reward
    #[inline]
    #[must_use]
    pub fn with_default_reward(mut self, reward: u32) -> Self {
        self.default_reward = reward;
        self
    }

    /// With feedback delay
    #[inline]
    #[must_use]
    pub fn with_feedback_delay(mut self, delay: Duration) -> Self {
        self.feedback_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With comment marker
    #[inline]
    #[must_use]
    pub fn with_comment_marker(mut self, marker: impl Into<String>) -> Self {
        self.comment_marker = marker.into();
        self
    }

    /// Pacing delay as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_penalty > 100 {
            return Err(ConfigError::Invalid {
                field: "failure_penalty",
                reason: format!("{} exceeds 100", self.failure_penalty),
            });
        }
        if self.default_reward == 0 {
            return Err(ConfigError::Invalid {
                field: "default_reward",
                reason: "must be positive".to_string(),
            });
        }
        if !self.comment_marker.is_empty() && self.comment_marker.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "comment_marker",
                reason: "must not be whitespace".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            failure_penalty: DEFAULT_FAILURE_PENALTY,
            default_reward: DEFAULT_REWARD,
            feedback_delay_ms: DEFAULT_FEEDBACK_DELAY_MS,
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
        }
    }
}
