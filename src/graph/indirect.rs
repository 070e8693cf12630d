//! Indirect Citation Expander: citations-of-citations as hard negatives

use super::citation::{CitationMap, CitationWeight, Citations};
use super::paper::PaperId;
use super::safety::SafePaperIndex;
use super::sanitize::SanitizedGraph;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Indirect citations of one query paper
///
/// Walks exactly two hops: the query's direct targets in `sanitized`, then
/// each target's citations in the `original` unsanitized map. Keeps only
/// targets the query does not cite directly, that are not the query itself,
/// and that are safe.
pub fn indirect_for(
    query: &PaperId,
    sanitized: &CitationMap,
    original: &CitationMap,
    safety: &SafePaperIndex,
) -> Citations {
    let Some(direct) = sanitized.get(query.as_str()) else {
        return Citations::new();
    };

    let mut second_hop: BTreeSet<&PaperId> = BTreeSet::new();
    for cited in direct.keys() {
        if let Some(citations) = original.get(cited.as_str()) {
            second_hop.extend(citations.keys());
        }
    }

    second_hop
        .into_iter()
        .filter(|id| *id != query)
        .filter(|id| !direct.contains_key(id.as_str()))
        .filter(|id| safety.is_safe(id.as_str()))
        .map(|id| (id.clone(), CitationWeight::INDIRECT))
        .collect()
}

/// Counts from an expansion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    pub queries: usize,
    pub indirect_edges: usize,
}

/// Add indirect citations to every query of the sanitized graph
///
/// One task per shard computes against read-only snapshots; results are
/// merged afterwards without overwriting direct edges.
pub fn expand_all(
    graph: &mut SanitizedGraph,
    original: &CitationMap,
    safety: &SafePaperIndex,
) -> ExpansionStats {
    let snapshot = &graph.citations;
    let per_shard: Vec<Vec<(PaperId, Citations)>> = graph
        .shards
        .par_iter()
        .map(|(_, (query_ids, _))| {
            query_ids
                .iter()
                .map(|q| (q.clone(), indirect_for(q, snapshot, original, safety)))
                .filter(|(_, c)| !c.is_empty())
                .collect()
        })
        .collect();

    let mut stats = ExpansionStats {
        queries: graph.citations.len(),
        ..Default::default()
    };
    for shard in per_shard {
        for (query, indirect) in shard {
            stats.indirect_edges += graph.citations.merge_indirect(&query, indirect);
        }
    }
    stats
}
