//! Follow-up tasks that run against the outputs of an earlier run

use super::output::{
    read_json, OutputDir, METADATA_JSON, PAPER_IDS_JSON, SAFE_PAPER_IDS_JSON, TITLES_JSON,
};
use super::worker_pool;
use crate::corpus::{collect_abstracts, AbstractCollection, ShardLayout};
use crate::error::{PrepError, PrepResult};
use crate::graph::{CitationMap, InboundMap, PaperId, SafePaperIndex};
use crate::qrel::{load_query_ids, QrelConfig, QrelCorpus, QrelSampler, QrelSummary};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Extract titles and abstracts for the papers of a prepared graph
///
/// Reads `paper_ids.json`, `safe_paper_ids.json` and `titles.json` from
/// `save_dir` and writes `metadata.json` next to them.
pub fn extract_metadata(
    data_dir: &Path,
    save_dir: &Path,
    shard_count: usize,
    workers: usize,
) -> PrepResult<AbstractCollection> {
    let paper_ids: Vec<PaperId> = read_json(&save_dir.join(PAPER_IDS_JSON))?;
    let safety: SafePaperIndex = read_json(&save_dir.join(SAFE_PAPER_IDS_JSON))?;
    let titles: HashMap<PaperId, String> = read_json(&save_dir.join(TITLES_JSON))?;
    info!(papers = paper_ids.len(), "extracting abstracts");

    let layout = ShardLayout::new(data_dir, shard_count);
    let pool = worker_pool(workers)?;
    let collection = pool.install(|| collect_abstracts(&layout, &paper_ids, &safety, &titles))?;

    let out = OutputDir::create(save_dir)?;
    out.write_json(METADATA_JSON, &collection.papers, false)?;
    Ok(collection)
}

/// Inputs for a standalone qrel run
#[derive(Debug, Clone)]
pub struct QrelFiles {
    /// Citation graph (`data.json`)
    pub data: PathBuf,
    /// Negative sampling universe (`paper_ids.json`)
    pub paper_ids: PathBuf,
    /// Query IDs, one per line
    pub queries: PathBuf,
    pub out: PathBuf,
    /// Inbound citations (`cited_by.json`), needed for co-citation positives
    pub cited_by: Option<PathBuf>,
    /// Outbound citations of the citers (`cites.json`); `data` when absent
    pub cites: Option<PathBuf>,
    /// Per-paper field labels, needed for cross-field negatives
    pub fields: Option<PathBuf>,
}

pub fn qrels_from_files(files: &QrelFiles, config: QrelConfig, seed: u64) -> PrepResult<QrelSummary> {
    let graph: CitationMap = read_json(&files.data)?;
    let universe: Vec<PaperId> = read_json(&files.paper_ids)?;
    let queries = load_query_ids(&files.queries)?;
    let cited_by: InboundMap = match &files.cited_by {
        Some(path) => read_json(path)?,
        None => InboundMap::new(),
    };
    let links: Option<CitationMap> = match &files.cites {
        Some(path) => Some(read_json(path)?),
        None => None,
    };
    let fields: Option<HashMap<PaperId, Vec<String>>> = match &files.fields {
        Some(path) => Some(read_json(path)?),
        None => None,
    };
    if config.cross_field && fields.is_none() {
        return Err(PrepError::InvalidConfig(
            "cross-field negatives need a fields file".to_string(),
        ));
    }

    let corpus = QrelCorpus {
        graph: &graph,
        cited_by: &cited_by,
        links: links.as_ref(),
        universe: &universe,
        fields: fields.as_ref(),
    };
    if let Some(parent) = files.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PrepError::io(parent, e))?;
    }
    let file = File::create(&files.out).map_err(|e| PrepError::io(&files.out, e))?;
    let mut writer = BufWriter::new(file);
    QrelSampler::new(config)
        .write_all(&queries, &corpus, seed, &mut writer)
        .map_err(|e| PrepError::io(&files.out, e))
}
