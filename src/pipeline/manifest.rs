//! Run manifest: what was run, with which settings, and what it produced

use crate::config::PipelineConfig;
use crate::corpus::ScanStats;
use crate::qrel::QrelSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts gathered across the stages of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub scan: ScanStats,
    pub papers_seen: usize,
    pub safe_papers: usize,
    pub query_papers: usize,
    pub removed_citations: usize,
    pub dropped_queries: usize,
    pub final_queries: usize,
    pub indirect_edges: usize,
    pub graph_papers: usize,
    pub split_sizes: BTreeMap<String, usize>,
    pub qrels: BTreeMap<String, QrelSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest<'a> {
    pub created_at: DateTime<Utc>,
    pub version: &'static str,
    pub config: &'a PipelineConfig,
    pub summary: &'a RunSummary,
}

impl<'a> RunManifest<'a> {
    pub fn new(config: &'a PipelineConfig, summary: &'a RunSummary) -> Self {
        Self {
            created_at: Utc::now(),
            version: crate::VERSION,
            config,
            summary,
        }
    }
}
