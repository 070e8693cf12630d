//! Qrel/Relevance Sampler
//!
//! For each query paper, draws a bounded number of positive candidates
//! (direct citations, or co-cited papers) and negative candidates (the rest
//! of the paper universe) and writes `query 0 candidate relevance` lines.

mod cocite;

pub use cocite::cocited_candidates;

use crate::error::{PrepError, PrepResult};
use crate::graph::{CitationMap, InboundMap, PaperId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

/// Random draws tried per wanted negative before exact sampling
const REJECTION_FACTOR: usize = 8;

/// Where positive candidates come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositiveMode {
    /// The query's direct outbound citations
    #[default]
    Direct,
    /// Papers cited alongside the query by the papers citing it
    Cocite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrelConfig {
    pub positives: usize,
    pub negatives: usize,
    pub mode: PositiveMode,
    /// Candidate cap for co-citation ranking
    pub max_cocited: usize,
    /// Only draw negatives whose fields are disjoint from the query's
    pub cross_field: bool,
}

impl Default for QrelConfig {
    fn default() -> Self {
        Self {
            positives: 5,
            negatives: 25,
            mode: PositiveMode::Direct,
            max_cocited: 20,
            cross_field: false,
        }
    }
}

/// One relevance judgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrelLine {
    pub query: PaperId,
    pub candidate: PaperId,
    pub relevance: u8,
}

impl std::fmt::Display for QrelLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} 0 {} {}", self.query, self.candidate, self.relevance)
    }
}

/// Read-only inputs for sampling
#[derive(Debug, Clone, Copy)]
pub struct QrelCorpus<'a> {
    pub graph: &'a CitationMap,
    pub cited_by: &'a InboundMap,
    /// Outbound citations of the citers in `cited_by`; `graph` when absent
    pub links: Option<&'a CitationMap>,
    /// Every known paper; negatives are drawn from here
    pub universe: &'a [PaperId],
    pub fields: Option<&'a HashMap<PaperId, Vec<String>>>,
}

/// Why a query produced no lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrelSkip {
    NotInGraph,
    NoPositiveCandidates,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QrelSummary {
    pub queries: usize,
    pub lines: usize,
    pub skipped_not_in_graph: usize,
    pub skipped_no_candidates: usize,
}

pub struct QrelSampler {
    config: QrelConfig,
}

impl QrelSampler {
    pub fn new(config: QrelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QrelConfig {
        &self.config
    }

    /// Positive candidates for a query, never including the query itself
    pub fn positive_candidates(&self, query: &PaperId, corpus: &QrelCorpus<'_>) -> Vec<PaperId> {
        match self.config.mode {
            PositiveMode::Direct => corpus
                .graph
                .direct_targets(query.as_str())
                .filter(|id| *id != query)
                .cloned()
                .collect(),
            PositiveMode::Cocite => {
                let links = corpus.links.unwrap_or(corpus.graph);
                cocited_candidates(query, links, corpus.cited_by, self.config.max_cocited)
                    .into_iter()
                    .map(|(id, _)| id)
                    .collect()
            }
        }
    }

    /// Judgments for one query: sampled positives then sampled negatives
    pub fn judge<R: Rng + ?Sized>(
        &self,
        query: &PaperId,
        corpus: &QrelCorpus<'_>,
        rng: &mut R,
    ) -> Result<Vec<QrelLine>, QrelSkip> {
        if !corpus.graph.contains(query.as_str()) {
            return Err(QrelSkip::NotInGraph);
        }
        let candidates = self.positive_candidates(query, corpus);
        if candidates.is_empty() {
            return Err(QrelSkip::NoPositiveCandidates);
        }

        let take = self.config.positives.min(candidates.len());
        let positives: Vec<PaperId> = candidates.choose_multiple(rng, take).cloned().collect();

        let excluded: HashSet<&PaperId> = candidates.iter().chain(std::iter::once(query)).collect();
        let query_fields = if self.config.cross_field {
            corpus
                .fields
                .and_then(|f| f.get(query))
                .filter(|f| !f.is_empty())
        } else {
            None
        };
        let accept = |id: &PaperId| {
            if excluded.contains(id) {
                return false;
            }
            match (query_fields, corpus.fields) {
                (Some(own), Some(all)) => all
                    .get(id)
                    .is_some_and(|theirs| !theirs.is_empty() && theirs.iter().all(|f| !own.contains(f))),
                _ => true,
            }
        };
        let negatives = sample_filtered(corpus.universe, self.config.negatives, accept, rng);

        let lines = positives
            .into_iter()
            .map(|candidate| QrelLine {
                query: query.clone(),
                candidate,
                relevance: 1,
            })
            .chain(negatives.into_iter().map(|candidate| QrelLine {
                query: query.clone(),
                candidate,
                relevance: 0,
            }))
            .collect();
        Ok(lines)
    }

    /// Judge every query and write the qrel lines
    ///
    /// Skipped queries are counted, not fatal.
    pub fn write_all<W: Write>(
        &self,
        queries: &[PaperId],
        corpus: &QrelCorpus<'_>,
        seed: u64,
        out: &mut W,
    ) -> std::io::Result<QrelSummary> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut summary = QrelSummary::default();

        for query in queries {
            summary.queries += 1;
            match self.judge(query, corpus, &mut rng) {
                Ok(lines) => {
                    for line in &lines {
                        writeln!(out, "{}", line)?;
                    }
                    summary.lines += lines.len();
                }
                Err(QrelSkip::NotInGraph) => summary.skipped_not_in_graph += 1,
                Err(QrelSkip::NoPositiveCandidates) => summary.skipped_no_candidates += 1,
            }
        }
        out.flush()?;

        if summary.skipped_not_in_graph > 0 {
            warn!(skipped = summary.skipped_not_in_graph, "queries missing from the graph");
        }
        if summary.skipped_no_candidates > 0 {
            warn!(skipped = summary.skipped_no_candidates, "queries without positive candidates");
        }
        info!(queries = summary.queries, lines = summary.lines, "wrote qrels");
        Ok(summary)
    }
}

/// Uniform sample without replacement of up to `k` accepted papers
///
/// Tries cheap random draws first; if they do not yield `k` papers, samples
/// exactly from the filtered universe.
fn sample_filtered<R, F>(universe: &[PaperId], k: usize, accept: F, rng: &mut R) -> Vec<PaperId>
where
    R: Rng + ?Sized,
    F: Fn(&PaperId) -> bool,
{
    if k == 0 || universe.is_empty() {
        return Vec::new();
    }

    let max_draws = k.saturating_mul(REJECTION_FACTOR);
    let mut tried: HashSet<usize> = HashSet::new();
    let mut picked = Vec::with_capacity(k);
    let mut draws = 0;
    while picked.len() < k && draws < max_draws && tried.len() < universe.len() {
        draws += 1;
        let i = rng.gen_range(0..universe.len());
        if tried.insert(i) && accept(&universe[i]) {
            picked.push(universe[i].clone());
        }
    }
    if picked.len() == k {
        return picked;
    }

    let pool: Vec<&PaperId> = universe.iter().filter(|id| accept(*id)).collect();
    pool.choose_multiple(rng, k.min(pool.len()))
        .map(|id| (*id).clone())
        .collect()
}

/// Read query paper IDs, one per line
pub fn load_query_ids(path: &Path) -> PrepResult<Vec<PaperId>> {
    let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
    let mut ids = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| PrepError::io(path, e))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            ids.push(PaperId::from(trimmed));
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<PaperId> {
        raw.iter().map(|s| PaperId::from(*s)).collect()
    }

    fn universe(n: usize) -> Vec<PaperId> {
        (0..n).map(|i| PaperId::new(format!("u{}", i))).collect()
    }

    #[test]
    fn line_format() {
        let line = QrelLine {
            query: "q".into(),
            candidate: "c".into(),
            relevance: 1,
        };
        assert_eq!(line.to_string(), "q 0 c 1");
    }

    #[test]
    fn direct_mode_bounds_and_labels() {
        let mut graph = CitationMap::new();
        graph.insert_direct("Q".into(), ids(&["u1", "u2", "u3", "u4", "u5", "u6", "u7"]));
        let cited_by = InboundMap::new();
        let all = universe(100);
        let corpus = QrelCorpus {
            graph: &graph,
            cited_by: &cited_by,
            links: None,
            universe: &all,
            fields: None,
        };
        let sampler = QrelSampler::new(QrelConfig::default());
        let mut rng = StdRng::seed_from_u64(1);

        let lines = sampler.judge(&"Q".into(), &corpus, &mut rng).unwrap();
        let positives: Vec<_> = lines.iter().filter(|l| l.relevance == 1).collect();
        let negatives: Vec<_> = lines.iter().filter(|l| l.relevance == 0).collect();
        assert_eq!(positives.len(), 5);
        assert_eq!(negatives.len(), 25);

        let cited: HashSet<_> = graph.get("Q").unwrap().keys().cloned().collect();
        assert!(positives.iter().all(|l| cited.contains(&l.candidate)));
        assert!(negatives.iter().all(|l| !cited.contains(&l.candidate)));
        let unique: HashSet<_> = negatives.iter().map(|l| &l.candidate).collect();
        assert_eq!(unique.len(), 25);
    }

    #[test]
    fn never_judges_query_against_itself() {
        let mut graph = CitationMap::new();
        graph.insert_direct("u0".into(), ids(&["u0", "u1"]));
        let cited_by = InboundMap::new();
        let all = universe(4);
        let corpus = QrelCorpus {
            graph: &graph,
            cited_by: &cited_by,
            links: None,
            universe: &all,
            fields: None,
        };
        let sampler = QrelSampler::new(QrelConfig::default());
        let mut rng = StdRng::seed_from_u64(3);

        let lines = sampler.judge(&"u0".into(), &corpus, &mut rng).unwrap();
        assert!(lines.iter().all(|l| l.candidate.as_str() != "u0"));
        // Only u2 and u3 remain as negatives
        assert_eq!(lines.iter().filter(|l| l.relevance == 0).count(), 2);
    }

    #[test]
    fn cross_field_negatives_have_disjoint_fields() {
        let mut graph = CitationMap::new();
        graph.insert_direct("u0".into(), ids(&["u1"]));
        let cited_by = InboundMap::new();
        let all = universe(50);
        let mut fields = HashMap::new();
        for (i, id) in all.iter().enumerate() {
            let field = if i % 2 == 0 { "Art" } else { "Physics" };
            fields.insert(id.clone(), vec![field.to_string()]);
        }
        let corpus = QrelCorpus {
            graph: &graph,
            cited_by: &cited_by,
            links: None,
            universe: &all,
            fields: Some(&fields),
        };
        let sampler = QrelSampler::new(QrelConfig {
            negatives: 10,
            cross_field: true,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(9);

        let lines = sampler.judge(&"u0".into(), &corpus, &mut rng).unwrap();
        for line in lines.iter().filter(|l| l.relevance == 0) {
            assert_eq!(fields[&line.candidate], vec!["Physics".to_string()]);
        }
    }

    #[test]
    fn cocite_without_overlap_is_skipped_and_counted() {
        let mut graph = CitationMap::new();
        graph.insert_direct("P".into(), ids(&["X"]));
        graph.insert_direct("R".into(), ids(&["P"]));
        let mut cited_by = InboundMap::new();
        cited_by.insert("P".into(), ids(&["R"]));
        let all = ids(&["P", "R", "X"]);
        let corpus = QrelCorpus {
            graph: &graph,
            cited_by: &cited_by,
            links: None,
            universe: &all,
            fields: None,
        };
        let sampler = QrelSampler::new(QrelConfig {
            mode: PositiveMode::Cocite,
            ..Default::default()
        });

        let mut out = Vec::new();
        let summary = sampler
            .write_all(&ids(&["P", "missing"]), &corpus, 321, &mut out)
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(summary.skipped_no_candidates, 1);
        assert_eq!(summary.skipped_not_in_graph, 1);
    }

    #[test]
    fn cocite_positives_come_from_citer_links() {
        let mut graph = CitationMap::new();
        graph.insert_direct("P".into(), ids(&["X"]));
        let mut links = CitationMap::new();
        links.insert_direct("R".into(), ids(&["P", "Y"]));
        let mut cited_by = InboundMap::new();
        cited_by.insert("P".into(), ids(&["R"]));
        let all = ids(&["P", "X"]);
        let corpus = QrelCorpus {
            graph: &graph,
            cited_by: &cited_by,
            links: Some(&links),
            universe: &all,
            fields: None,
        };
        let sampler = QrelSampler::new(QrelConfig {
            mode: PositiveMode::Cocite,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(5);

        let lines = sampler.judge(&"P".into(), &corpus, &mut rng).unwrap();
        let rendered: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(rendered, vec!["P 0 Y 1", "P 0 X 0"]);
    }

    #[test]
    fn sampling_is_reproducible() {
        let mut graph = CitationMap::new();
        graph.insert_direct("u0".into(), ids(&["u1", "u2", "u3", "u4", "u5", "u6"]));
        let cited_by = InboundMap::new();
        let all = universe(200);
        let corpus = QrelCorpus {
            graph: &graph,
            cited_by: &cited_by,
            links: None,
            universe: &all,
            fields: None,
        };
        let sampler = QrelSampler::new(QrelConfig::default());
        let queries = ids(&["u0"]);

        let mut first = Vec::new();
        let mut second = Vec::new();
        sampler.write_all(&queries, &corpus, 42, &mut first).unwrap();
        sampler.write_all(&queries, &corpus, 42, &mut second).unwrap();
        assert_eq!(first, second);
    }
}
