//! Pipeline configuration
//!
//! Every field has a default, so a YAML file only needs the keys it changes.
//! CLI flags are applied on top of whatever the file provides.

use crate::corpus::DEFAULT_SHARD_COUNT;
use crate::error::{PrepError, PrepResult};
use crate::qrel::QrelConfig;
use crate::split::SplitConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default seed for splitting and qrel sampling
pub const DEFAULT_SEED: u64 = 321;

/// Query-paper selection options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Keep only query papers with one of these field labels
    pub fields_of_study: Vec<String>,
    /// Require query papers to span at least two fields
    pub cross_domain: bool,
    /// Co-citation mode: require inbound citations and keep them
    pub cocite: bool,
    /// File of external identifiers (one per line) restricting query papers
    pub id_list: Option<PathBuf>,
    /// TSV mapping external identifiers to paper IDs
    pub id_mapping: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory containing `metadata/` (and `pdf_parses/`)
    pub data_dir: PathBuf,
    /// Directory receiving every output file
    pub save_dir: PathBuf,
    pub shard_count: usize,
    /// Shards whose query papers are sanitized, expanded and split
    /// (all shards are always read)
    pub query_shards: Option<Vec<usize>>,
    /// Worker threads; 0 uses available parallelism
    pub workers: usize,
    pub seed: u64,
    /// Abort on the first malformed record
    pub strict: bool,
    pub filter: FilterConfig,
    pub split: SplitConfig,
    /// Also write `val.qrel` and `test.qrel`
    pub qrel: Option<QrelConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            save_dir: PathBuf::new(),
            shard_count: DEFAULT_SHARD_COUNT,
            query_shards: None,
            workers: 0,
            seed: DEFAULT_SEED,
            strict: false,
            filter: FilterConfig::default(),
            split: SplitConfig::default(),
            qrel: None,
        }
    }
}

impl PipelineConfig {
    pub fn new(data_dir: impl Into<PathBuf>, save_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            save_dir: save_dir.into(),
            ..Default::default()
        }
    }

    pub fn from_yaml_str(text: &str) -> PrepResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file(path: &Path) -> PrepResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        Self::from_yaml_str(&text)
    }

    /// Shards to sanitize, expand and split, in ascending order
    pub fn selected_shards(&self) -> Vec<usize> {
        match &self.query_shards {
            Some(shards) if !shards.is_empty() => {
                let mut shards = shards.clone();
                shards.sort_unstable();
                shards.dedup();
                shards
            }
            _ => (0..self.shard_count).collect(),
        }
    }

    pub fn validate(&self) -> PrepResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(PrepError::InvalidConfig("data_dir is not set".to_string()));
        }
        if self.save_dir.as_os_str().is_empty() {
            return Err(PrepError::InvalidConfig("save_dir is not set".to_string()));
        }
        if self.shard_count == 0 {
            return Err(PrepError::InvalidConfig("shard_count must be positive".to_string()));
        }
        if let Some(shards) = &self.query_shards {
            if let Some(&bad) = shards.iter().find(|&&s| s >= self.shard_count) {
                return Err(PrepError::InvalidShard {
                    shard: bad,
                    shard_count: self.shard_count,
                });
            }
        }
        if self.filter.id_mapping.is_some() && self.filter.id_list.is_none() {
            return Err(PrepError::InvalidConfig(
                "id_mapping requires id_list".to_string(),
            ));
        }
        self.split.validate()
    }
}
