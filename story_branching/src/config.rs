//! Tree configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{BranchError, BranchResult};

/// Budget and thresholds for a branch tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Upper bound on the number of active branches.
    pub max_active: usize,

    /// Generations of descent allowed below the committed tip.
    pub max_depth: u32,

    /// Minimum character consistency a candidate needs to become active.
    pub min_consistency: f64,

    /// Concurrent content-synthesis calls per evolve step.
    pub worker_limit: usize,

    /// Timeout for a single content-synthesis call, in milliseconds.
    pub synthesis_timeout_ms: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_active: 5,
            max_depth: 3,
            min_consistency: 0.3,
            worker_limit: 4,
            synthesis_timeout_ms: 30_000,
        }
    }
}

impl TreeConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> BranchResult<Self> {
        let config: TreeConfig =
            toml::from_str(source).map_err(|e| BranchError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> BranchResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| BranchError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> BranchResult<()> {
        if self.max_active == 0 {
            return Err(BranchError::InvalidConfig("max_active must be at least 1".into()));
        }
        if self.max_depth == 0 {
            return Err(BranchError::InvalidConfig("max_depth must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.min_consistency) {
            return Err(BranchError::InvalidConfig(format!(
                "min_consistency {} outside [0, 1]",
                self.min_consistency
            )));
        }
        if self.worker_limit == 0 {
            return Err(BranchError::InvalidConfig("worker_limit must be at least 1".into()));
        }
        Ok(())
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_millis(self.synthesis_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TreeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_consistency, 0.3);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = TreeConfig::from_toml_str("max_active = 8\nmax_depth = 2").unwrap();
        assert_eq!(config.max_active, 8);
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.worker_limit, 4);
        assert_eq!(config.synthesis_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = TreeConfig::from_toml_str("max_active = 0").unwrap_err();
        assert!(matches!(err, BranchError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_threshold() {
        assert!(TreeConfig::from_toml_str("min_consistency = 1.5").is_err());
        assert!(TreeConfig::from_toml_str("max_active = \"many\"").is_err());
    }
}
