//! Error types shared by every pipeline stage

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a preparation run
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Shard file missing: {0}")]
    MissingShard(PathBuf),

    #[error("Shard {shard} line {line}: malformed record: {reason}")]
    MalformedRecord {
        shard: usize,
        line: usize,
        reason: String,
    },

    #[error("Invalid shard number {shard} (shard count is {shard_count})")]
    InvalidShard { shard: usize, shard_count: usize },

    #[error("Invalid split proportions: {0}")]
    InvalidProportions(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl PrepError {
    /// Attach a path to an IO error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for preparation operations
pub type PrepResult<T> = Result<T, PrepError>;
