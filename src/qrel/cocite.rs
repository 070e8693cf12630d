//! Co-citation candidate ranking

use crate::graph::{CitationMap, InboundMap, PaperId};
use std::collections::{BTreeSet, HashMap};

/// Papers co-cited with `query`, most frequent first
///
/// For every distinct paper R citing the query, each paper R cites directly
/// counts once. `links` holds the outbound citations of the citers, which
/// need not be query papers. Ranked by count descending, then ID ascending,
/// and cut at `max` after counting, so ties that straddle the cap are dropped.
pub fn cocited_candidates(
    query: &PaperId,
    links: &CitationMap,
    cited_by: &InboundMap,
    max: usize,
) -> Vec<(PaperId, usize)> {
    let Some(citers) = cited_by.get(query) else {
        return Vec::new();
    };
    let citers: BTreeSet<&PaperId> = citers.iter().collect();

    let mut counts: HashMap<&PaperId, usize> = HashMap::new();
    for citer in citers {
        for candidate in links.direct_targets(citer.as_str()) {
            if candidate != query {
                *counts.entry(candidate).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(PaperId, usize)> = counts
        .into_iter()
        .map(|(id, n)| (id.clone(), n))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(max);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<PaperId> {
        raw.iter().map(|s| PaperId::from(*s)).collect()
    }

    #[test]
    fn ranks_by_shared_citers() {
        let mut graph = CitationMap::new();
        graph.insert_direct("R1".into(), ids(&["P", "X", "Y"]));
        graph.insert_direct("R2".into(), ids(&["P", "X"]));
        graph.insert_direct("R3".into(), ids(&["P", "Z"]));
        let mut cited_by = InboundMap::new();
        cited_by.insert("P".into(), ids(&["R1", "R2", "R3"]));

        let ranked = cocited_candidates(&"P".into(), &graph, &cited_by, 10);
        assert_eq!(
            ranked,
            vec![("X".into(), 2), ("Y".into(), 1), ("Z".into(), 1)]
        );
    }

    #[test]
    fn cap_cuts_ties_deterministically() {
        let mut graph = CitationMap::new();
        graph.insert_direct("R1".into(), ids(&["P", "B", "A", "C"]));
        let mut cited_by = InboundMap::new();
        cited_by.insert("P".into(), ids(&["R1"]));

        let ranked = cocited_candidates(&"P".into(), &graph, &cited_by, 2);
        assert_eq!(ranked, vec![("A".into(), 1), ("B".into(), 1)]);
    }

    #[test]
    fn repeated_citer_counts_once() {
        let mut links = CitationMap::new();
        links.insert_direct("R1".into(), ids(&["P", "X"]));
        links.insert_direct("R2".into(), ids(&["P", "Y"]));
        let mut cited_by = InboundMap::new();
        cited_by.insert("P".into(), ids(&["R1", "R1", "R1", "R2"]));

        let ranked = cocited_candidates(&"P".into(), &links, &cited_by, 10);
        assert_eq!(ranked, vec![("X".into(), 1), ("Y".into(), 1)]);
    }

    #[test]
    fn no_citers_no_candidates() {
        let graph = CitationMap::new();
        let cited_by = InboundMap::new();
        assert!(cocited_candidates(&"P".into(), &graph, &cited_by, 5).is_empty());
    }
}
