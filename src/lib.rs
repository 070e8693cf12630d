//! Citegraph: citation-graph data preparation for embedding training
//!
//! Reads a sharded scholarly corpus and produces the files an embedding
//! trainer consumes: a weighted citation graph, field-stratified query
//! splits, paper metadata and relevance judgments.
//!
//! # Core Concepts
//!
//! - **Safe papers**: papers with complete metadata; only these appear as graph nodes
//! - **Query papers**: eligible papers chosen as training/evaluation anchors
//! - **Citation weights**: direct citations (5) and citations of citations (1)
//! - **Splits**: per-field train/val/test partitions of the query papers
//!
//! # Example
//!
//! ```no_run
//! use citegraph::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new("/data/corpus", "/data/out");
//! let summary = Pipeline::new(config).run()?;
//! println!("{} query papers", summary.final_queries);
//! # Ok::<(), citegraph::PrepError>(())
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod qrel;
pub mod split;

pub use config::{FilterConfig, PipelineConfig, DEFAULT_SEED};
pub use corpus::{QueryFilter, ShardLayout, DEFAULT_SHARD_COUNT};
pub use error::{PrepError, PrepResult};
pub use graph::{CitationMap, CitationWeight, PaperId, SafePaperIndex, ShardStatus};
pub use pipeline::{extract_metadata, qrels_from_files, Pipeline, QrelFiles, RunSummary};
pub use qrel::{PositiveMode, QrelConfig, QrelSampler, QrelSummary};
pub use split::{stratified_split, Split, SplitAssignment, SplitConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
