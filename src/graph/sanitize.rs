//! Sanitizer: drop citations to unsafe papers and queries left empty

use super::builder::CorpusGraph;
use super::citation::{CitationMap, Citations, InboundMap};
use super::fields::FieldIndex;
use super::paper::PaperId;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// One shard's sanitized slice of the graph
#[derive(Debug, Clone, Default)]
pub struct SanitizedShard {
    pub shard: usize,
    pub citations: CitationMap,
    pub cited_by: InboundMap,
    pub query_ids: Vec<PaperId>,
    pub fields: FieldIndex,
    /// Citation targets removed for being unsafe
    pub removed_citations: usize,
    /// Query papers removed because nothing valid remained
    pub dropped_queries: Vec<PaperId>,
}

/// Sanitize the slice owned by `shard`
///
/// Reads the shard's queries from the corpus-wide map and never writes to
/// it. In co-citation mode (`cocite`) a query is also dropped once no safe
/// inbound citer remains.
pub fn sanitize_shard(corpus: &CorpusGraph, shard: usize, cocite: bool) -> SanitizedShard {
    let mut out = SanitizedShard {
        shard,
        ..Default::default()
    };
    let Some(slice) = corpus.shard(shard) else {
        return out;
    };
    out.fields = slice.fields.clone();

    for query in &slice.query_ids {
        let Some(original) = corpus.direct.get(query.as_str()) else {
            continue;
        };
        let kept: Citations = original
            .iter()
            .filter(|(target, _)| corpus.safety.is_safe(target.as_str()))
            .map(|(target, weight)| (target.clone(), *weight))
            .collect();
        out.removed_citations += original.len() - kept.len();

        let inbound: Vec<PaperId> = if cocite {
            slice
                .cited_by
                .get(query)
                .map(|ids| {
                    ids.iter()
                        .filter(|id| corpus.safety.is_safe(id.as_str()))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        if kept.is_empty() || (cocite && inbound.is_empty()) {
            out.fields.remove_paper(query.as_str());
            out.dropped_queries.push(query.clone());
            continue;
        }

        out.citations.insert_query(query.clone(), kept);
        if cocite {
            out.cited_by.insert(query.clone(), inbound);
        }
        out.query_ids.push(query.clone());
    }

    out
}

/// Sanitized graph assembled from shard slices
#[derive(Debug, Clone, Default)]
pub struct SanitizedGraph {
    /// Final citation data (direct citations only until expansion)
    pub citations: CitationMap,
    pub cited_by: InboundMap,
    /// Per-shard query IDs and field indexes, in shard order
    pub shards: BTreeMap<usize, (Vec<PaperId>, FieldIndex)>,
    pub removed_citations: usize,
    pub dropped_queries: usize,
}

impl SanitizedGraph {
    /// Field index over all sanitized shards, lists appended in shard order
    pub fn field_index(&self) -> FieldIndex {
        let mut merged = FieldIndex::new();
        for (_, fields) in self.shards.values() {
            merged.absorb(fields.clone());
        }
        merged
    }

    pub fn query_count(&self) -> usize {
        self.citations.len()
    }
}

/// Sanitize the given shards in parallel and concatenate the results
pub fn sanitize_all(corpus: &CorpusGraph, shards: &[usize], cocite: bool) -> SanitizedGraph {
    let results: Vec<SanitizedShard> = shards
        .par_iter()
        .map(|&shard| sanitize_shard(corpus, shard, cocite))
        .collect();

    let mut graph = SanitizedGraph::default();
    for result in results {
        graph.citations.absorb(result.citations);
        graph.cited_by.extend(result.cited_by);
        graph.removed_citations += result.removed_citations;
        graph.dropped_queries += result.dropped_queries.len();
        graph
            .shards
            .insert(result.shard, (result.query_ids, result.fields));
    }
    graph
}
