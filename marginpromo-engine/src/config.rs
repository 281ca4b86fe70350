//! Engine configuration, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("parse config TOML: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on concurrent fan-out workers.
    pub max_parallelism: usize,
    /// Package type tag that marks a margin account.
    pub margin_account_type: String,
    /// Rates at or above this are never offered; also the running-minimum sentinel.
    pub rate_ceiling: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parallelism: 8,
            margin_account_type: "M".to_string(),
            rate_ceiling: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallelism == 0 {
            return Err(ConfigError::Invalid("max_parallelism must be at least 1".into()));
        }
        if self.margin_account_type.trim().is_empty() {
            return Err(ConfigError::Invalid("margin_account_type must not be empty".into()));
        }
        if !self.rate_ceiling.is_finite() || self.rate_ceiling <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "rate_ceiling must be a positive finite rate, got {}",
                self.rate_ceiling
            )));
        }
        Ok(())
    }
}
