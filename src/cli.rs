//! Options shared by the command-line tools.

use std::path::PathBuf;

use clap::Args;

use crate::config::{ConfigError, RunConfig};

#[derive(Debug, Clone, Args)]
pub struct RunOptions {
    /// Directory containing the Markdown documents
    #[arg(long, default_value = "documents")]
    pub documents_dir: PathBuf,

    /// Directory holding cached keyword signatures
    #[arg(long, default_value = ".evidence-cache/signatures")]
    pub cache_dir: PathBuf,

    /// JSON run configuration; flags below override its fields
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum number of documents to select
    #[arg(long)]
    pub min_count: Option<usize>,

    /// Maximum number of documents to select
    #[arg(long)]
    pub max_count: Option<usize>,

    /// Fixed relevance threshold (0-10) instead of the adaptive cutoff
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Oracle calls in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Deadline for all oracle work, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl RunOptions {
    /// Config file (or defaults) with command-line overrides applied, validated.
    pub fn load_config(&self) -> Result<RunConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(min_count) = self.min_count {
            config.selection.min_count = min_count;
        }
        if let Some(max_count) = self.max_count {
            config.selection.max_count = max_count;
        }
        if let Some(threshold) = self.threshold {
            config.selection.threshold = Some(threshold);
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.run_timeout_secs = timeout_secs;
        }

        config.validate()?;
        Ok(config)
    }
}
