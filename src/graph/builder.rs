//! Citation Graph Builder: merge per-shard scans into corpus-wide structures

use super::citation::{CitationMap, Citations, InboundMap};
use super::fields::FieldIndex;
use super::paper::PaperId;
use super::safety::SafePaperIndex;
use crate::corpus::{ScanStats, ShardScan};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The query-side structures one shard owns until sanitization
#[derive(Debug, Clone, Default)]
pub struct ShardSlice {
    pub query_ids: Vec<PaperId>,
    pub fields: FieldIndex,
    pub cited_by: InboundMap,
}

/// Corpus-wide view built from every shard scan
///
/// `direct` is the unsanitized citation map over all shards. It is only read
/// after construction.
#[derive(Debug, Clone, Default)]
pub struct CorpusGraph {
    pub direct: CitationMap,
    pub safety: SafePaperIndex,
    pub titles: HashMap<PaperId, String>,
    pub paper_fields: HashMap<PaperId, Vec<String>>,
    /// Outbound citations of every eligible paper, kept in co-citation mode
    pub outbound: CitationMap,
    pub shards: BTreeMap<usize, ShardSlice>,
    pub stats: ScanStats,
}

impl CorpusGraph {
    /// Query papers across all shards
    pub fn query_count(&self) -> usize {
        self.shards.values().map(|s| s.query_ids.len()).sum()
    }

    pub fn shard(&self, shard: usize) -> Option<&ShardSlice> {
        self.shards.get(&shard)
    }

    /// Shard that owns a query paper's entry, recovered from the safe index
    pub fn owner_of(&self, query: &str) -> Option<usize> {
        if self.direct.contains(query) {
            self.safety.shard_of(query)
        } else {
            None
        }
    }

    /// Safe outbound citations of every paper citing a query in `cited_by`
    ///
    /// Citers need not be query papers themselves; this is the adjacency
    /// co-citation ranking walks.
    pub fn citer_links(&self, cited_by: &InboundMap) -> CitationMap {
        let citers: BTreeSet<&PaperId> = cited_by.values().flatten().collect();
        let mut links = CitationMap::new();
        for citer in citers {
            let Some(targets) = self.outbound.get(citer.as_str()) else {
                continue;
            };
            let safe: Citations = targets
                .iter()
                .filter(|(target, _)| self.safety.is_safe(target.as_str()))
                .map(|(target, weight)| (target.clone(), *weight))
                .collect();
            if !safe.is_empty() {
                links.insert_query(citer.clone(), safe);
            }
        }
        links
    }
}

/// Merge shard scans into a corpus graph
///
/// Key sets are disjoint across shards by construction; if one collides, the
/// later shard's entry wins.
pub fn build_corpus<I>(scans: I) -> CorpusGraph
where
    I: IntoIterator<Item = ShardScan>,
{
    let mut corpus = CorpusGraph::default();
    for scan in scans {
        corpus.direct.absorb(scan.citations);
        corpus.safety.absorb(scan.safety);
        corpus.titles.extend(scan.titles);
        corpus.paper_fields.extend(scan.paper_fields);
        corpus.outbound.absorb(scan.outbound);
        corpus.stats.absorb(&scan.stats);
        corpus.shards.insert(
            scan.shard,
            ShardSlice {
                query_ids: scan.query_ids,
                fields: scan.fields,
                cited_by: scan.cited_by,
            },
        );
    }
    corpus
}
