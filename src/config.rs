use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::{DEFAULT_CONCURRENCY, DEFAULT_MAX_KEYWORDS};
use crate::oracle::RetryPolicy;
use crate::selection::SelectionConstraints;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for one control run. Oracle connection settings are not part of
/// this struct; they come from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub selection: SelectionConstraints,
    /// Oracle calls in flight at once.
    pub concurrency: usize,
    /// Deadline for all oracle work in a run.
    pub run_timeout_secs: u64,
    pub retry: RetryPolicy,
    pub max_keywords: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConstraints::default(),
            concurrency: DEFAULT_CONCURRENCY,
            run_timeout_secs: 600,
            retry: RetryPolicy::default(),
            max_keywords: DEFAULT_MAX_KEYWORDS,
        }
    }
}

impl RunConfig {
    /// Load from a JSON file; absent fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        let config: RunConfig = serde_json::from_slice(&bytes)?;
        Ok(config)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selection
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        if self.run_timeout_secs == 0 {
            return Err(ConfigError::Invalid("run_timeout_secs must be at least 1".into()));
        }
        if self.max_keywords == 0 {
            return Err(ConfigError::Invalid("max_keywords must be at least 1".into()));
        }
        Ok(())
    }
}
