//! Refinement loop policy.

use serde::{Deserialize, Serialize};

use crate::domain::{CopyloopError, Result};

/// Default iteration budget.
pub const DEFAULT_MAX_ITERS: u32 = 5;

/// Default number of times one exact failure message may be seen before the
/// run is declared stuck.
pub const DEFAULT_REPEAT_THRESHOLD: u32 = 3;

/// Bounded refinement policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Maximum number of evaluate/fix rounds.
    pub max_iters: u32,
    /// Occurrences of the same failure message that trigger loop detection.
    pub repeat_threshold: u32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_iters: DEFAULT_MAX_ITERS,
            repeat_threshold: DEFAULT_REPEAT_THRESHOLD,
        }
    }
}

impl RefineConfig {
    /// Defaults overridden by `COPYLOOP_MAX_ITERS` and
    /// `COPYLOOP_REPEAT_THRESHOLD` when set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(max_iters) = read_env_u32("COPYLOOP_MAX_ITERS")? {
            config.max_iters = max_iters;
        }
        if let Some(threshold) = read_env_u32("COPYLOOP_REPEAT_THRESHOLD")? {
            config.repeat_threshold = threshold;
        }
        Ok(config)
    }

    pub fn with_max_iters(mut self, max_iters: u32) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_repeat_threshold(mut self, repeat_threshold: u32) -> Self {
        self.repeat_threshold = repeat_threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iters == 0 {
            return Err(CopyloopError::InvalidConfig(
                "max_iters must be at least 1".to_string(),
            ));
        }
        if self.repeat_threshold == 0 {
            return Err(CopyloopError::InvalidConfig(
                "repeat_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| CopyloopError::InvalidConfig(format!("{key} must be a number, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RefineConfig::default();
        assert_eq!(config.max_iters, 5);
        assert_eq!(config.repeat_threshold, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let err = RefineConfig::default().with_max_iters(0).validate();
        assert!(matches!(err, Err(CopyloopError::InvalidConfig(_))));

        let err = RefineConfig::default().with_repeat_threshold(0).validate();
        assert!(matches!(err, Err(CopyloopError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: RefineConfig = serde_json::from_str(r#"{"max_iters": 8}"#).expect("parse");
        assert_eq!(config.max_iters, 8);
        assert_eq!(config.repeat_threshold, DEFAULT_REPEAT_THRESHOLD);
    }
}
