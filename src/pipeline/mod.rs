//! End-to-end preparation run
//!
//! Stages run in order inside one worker pool:
//! scan shards, build the corpus graph, sanitize, expand indirect
//! citations, split, write outputs, and optionally sample qrels.

mod extract;
mod manifest;
mod output;

pub use extract::{extract_metadata, qrels_from_files, QrelFiles};
pub use manifest::{RunManifest, RunSummary};
pub use output::{
    read_json, OutputDir, CITED_BY_JSON, CITES_JSON, DATA_JSON, FIELDS_BY_PAPER_JSON, FIELDS_BY_SPLIT_JSON,
    MANIFEST_JSON, METADATA_JSON, PAPER_IDS_JSON, SAFE_PAPER_IDS_JSON, TITLES_JSON,
};

use crate::config::PipelineConfig;
use crate::corpus::{
    load_id_list, scan_shard, IdMapping, InclusionSet, QueryFilter, ShardLayout, ShardScan,
};
use crate::error::{PrepError, PrepResult};
use crate::graph::{
    build_corpus, expand_all, sanitize_all, CitationMap, CorpusGraph, PaperId, SanitizedGraph,
};
use crate::qrel::{QrelCorpus, QrelSampler};
use crate::split::{stratified_split, Split, SplitAssignment};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

/// Build a rayon pool; zero workers means rayon's default
pub(crate) fn worker_pool(workers: usize) -> PrepResult<rayon::ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new().num_threads(workers).build()?)
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage and write all outputs under `save_dir`
    pub fn run(&self) -> PrepResult<RunSummary> {
        self.config.validate()?;
        let filter = self.query_filter()?;
        let pool = worker_pool(self.config.workers)?;
        info!(
            data_dir = %self.config.data_dir.display(),
            save_dir = %self.config.save_dir.display(),
            threads = pool.current_num_threads(),
            "starting preparation run"
        );
        pool.install(|| self.run_stages(&filter))
    }

    fn query_filter(&self) -> PrepResult<QueryFilter> {
        let filter = &self.config.filter;
        let mut query_filter = QueryFilter::new()
            .with_fields(filter.fields_of_study.iter().cloned())
            .cross_domain(filter.cross_domain)
            .cocite(filter.cocite);
        if let Some(inclusion) = self.inclusion_set()? {
            query_filter = query_filter.with_inclusion(inclusion);
        }
        Ok(query_filter)
    }

    fn inclusion_set(&self) -> PrepResult<Option<InclusionSet>> {
        let Some(list) = &self.config.filter.id_list else {
            return Ok(None);
        };
        let external = load_id_list(list)?;
        let inclusion = match &self.config.filter.id_mapping {
            Some(path) => {
                let mapping = IdMapping::load(path)?;
                let (papers, misses) = mapping.translate(&external);
                if misses > 0 {
                    warn!(misses, "identifiers without a mapped paper ID");
                }
                InclusionSet::Papers(papers)
            }
            None => InclusionSet::External(external),
        };
        info!(ids = inclusion.len(), "loaded inclusion list");
        Ok(Some(inclusion))
    }

    fn run_stages(&self, filter: &QueryFilter) -> PrepResult<RunSummary> {
        let config = &self.config;
        let layout = ShardLayout::new(&config.data_dir, config.shard_count);

        let started = Instant::now();
        let shards: Vec<usize> = layout.shards().collect();
        let scans: Vec<ShardScan> = shards
            .par_iter()
            .map(|&shard| scan_shard(&layout, shard, filter, config.strict))
            .collect::<PrepResult<_>>()?;
        let corpus = build_corpus(scans);
        info!(
            papers = corpus.safety.len(),
            queries = corpus.query_count(),
            malformed = corpus.stats.malformed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built corpus graph"
        );

        let started = Instant::now();
        let selected = config.selected_shards();
        let mut graph = sanitize_all(&corpus, &selected, config.filter.cocite);
        info!(
            shards = selected.len(),
            queries = graph.query_count(),
            removed_citations = graph.removed_citations,
            dropped_queries = graph.dropped_queries,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sanitized graph"
        );

        let started = Instant::now();
        let expansion = expand_all(&mut graph, &corpus.direct, &corpus.safety);
        info!(
            queries = expansion.queries,
            indirect_edges = expansion.indirect_edges,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "expanded indirect citations"
        );

        let assignment = stratified_split(&graph.field_index(), &config.split, config.seed);
        for split in Split::ALL {
            info!(split = %split, papers = assignment.get(split).len(), "assigned split");
        }

        let out = OutputDir::create(&config.save_dir)?;
        let paper_ids: Vec<PaperId> = graph.citations.all_paper_ids().into_iter().collect();
        let links = config
            .filter
            .cocite
            .then(|| corpus.citer_links(&graph.cited_by));
        self.write_graph(&out, &corpus, &graph, &paper_ids, links.as_ref())?;
        write_splits(&out, &assignment)?;

        let mut summary = RunSummary {
            scan: corpus.stats.clone(),
            papers_seen: corpus.safety.len(),
            safe_papers: corpus.safety.safe_count(),
            query_papers: corpus.query_count(),
            removed_citations: graph.removed_citations,
            dropped_queries: graph.dropped_queries,
            final_queries: graph.query_count(),
            indirect_edges: expansion.indirect_edges,
            graph_papers: paper_ids.len(),
            split_sizes: Split::ALL
                .iter()
                .map(|s| (s.name().to_string(), assignment.get(*s).len()))
                .collect(),
            qrels: BTreeMap::new(),
        };

        if let Some(qrel_config) = &config.qrel {
            let sampler = QrelSampler::new(qrel_config.clone());
            let qrel_corpus = QrelCorpus {
                graph: &graph.citations,
                cited_by: &graph.cited_by,
                links: links.as_ref(),
                universe: &paper_ids,
                fields: Some(&corpus.paper_fields),
            };
            for split in [Split::Val, Split::Test] {
                let name = format!("{}.qrel", split);
                let path = out.path(&name);
                let mut writer = out.writer(&name)?;
                let qrels = sampler
                    .write_all(assignment.get(split), &qrel_corpus, config.seed, &mut writer)
                    .map_err(|e| PrepError::io(&path, e))?;
                summary.qrels.insert(split.name().to_string(), qrels);
            }
        }

        out.write_json(MANIFEST_JSON, &RunManifest::new(config, &summary), true)?;
        info!(
            queries = summary.final_queries,
            papers = summary.graph_papers,
            "preparation run complete"
        );
        Ok(summary)
    }

    fn write_graph(
        &self,
        out: &OutputDir,
        corpus: &CorpusGraph,
        graph: &SanitizedGraph,
        paper_ids: &[PaperId],
        links: Option<&CitationMap>,
    ) -> PrepResult<()> {
        out.write_json(DATA_JSON, &graph.citations, true)?;
        out.write_json(PAPER_IDS_JSON, paper_ids, false)?;
        out.write_json(SAFE_PAPER_IDS_JSON, &corpus.safety.sorted(), false)?;

        let titles: BTreeMap<&PaperId, &String> = corpus.titles.iter().collect();
        out.write_json(TITLES_JSON, &titles, false)?;

        let fields: BTreeMap<&PaperId, &Vec<String>> = paper_ids
            .iter()
            .filter_map(|id| corpus.paper_fields.get(id).map(|f| (id, f)))
            .collect();
        out.write_json(FIELDS_BY_PAPER_JSON, &fields, false)?;

        if self.config.filter.cocite {
            out.write_json(CITED_BY_JSON, &graph.cited_by, false)?;
        }
        if let Some(links) = links {
            out.write_json(CITES_JSON, links, false)?;
        }
        Ok(())
    }
}

fn write_splits(out: &OutputDir, assignment: &SplitAssignment) -> PrepResult<()> {
    for split in Split::ALL {
        out.write_lines(&format!("{}.txt", split), assignment.get(split))?;
    }
    out.write_json(FIELDS_BY_SPLIT_JSON, &assignment.fields_by_split(), false)?;
    Ok(())
}
