//! Weighted citation adjacency: query paper → cited paper → provenance weight

use super::paper::PaperId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Provenance weight of a citation edge
///
/// Serialized as `{"count": n}`, the shape the training loader reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationWeight {
    pub count: u8,
}

impl CitationWeight {
    /// Edge present in the paper's own outbound citation list
    pub const DIRECT: Self = Self { count: 5 };
    /// Citation of a citation, used as a hard negative
    pub const INDIRECT: Self = Self { count: 1 };

    pub fn is_direct(&self) -> bool {
        self.count >= Self::DIRECT.count
    }
}

/// Cited paper → weight for a single query paper
pub type Citations = BTreeMap<PaperId, CitationWeight>;

/// Query paper → inbound citing papers (co-citation mode)
pub type InboundMap = BTreeMap<PaperId, Vec<PaperId>>;

/// The citation graph, keyed by query paper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationMap {
    entries: BTreeMap<PaperId, Citations>,
}

impl CitationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a query paper with its citations.
    ///
    /// First writer wins: returns `false` and leaves the map unchanged if the
    /// query is already present.
    pub fn insert_query(&mut self, query: PaperId, citations: Citations) -> bool {
        if self.entries.contains_key(&query) {
            return false;
        }
        self.entries.insert(query, citations);
        true
    }

    /// Insert a query paper whose outbound list is all direct citations
    pub fn insert_direct<I>(&mut self, query: PaperId, targets: I) -> bool
    where
        I: IntoIterator<Item = PaperId>,
    {
        let citations = targets
            .into_iter()
            .map(|t| (t, CitationWeight::DIRECT))
            .collect();
        self.insert_query(query, citations)
    }

    /// Union with another map; on a colliding key the other map's entry wins
    pub fn absorb(&mut self, other: CitationMap) {
        self.entries.extend(other.entries);
    }

    /// Add indirect citations to a query without overwriting existing edges
    ///
    /// Returns the number of edges actually added. Queries not already in the
    /// map are ignored.
    pub fn merge_indirect(&mut self, query: &PaperId, indirect: Citations) -> usize {
        let Some(existing) = self.entries.get_mut(query) else {
            return 0;
        };
        let mut added = 0;
        for (target, weight) in indirect {
            if let std::collections::btree_map::Entry::Vacant(slot) = existing.entry(target) {
                slot.insert(weight);
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, query: &str) -> Option<&Citations> {
        self.entries.get(query)
    }

    pub fn contains(&self, query: &str) -> bool {
        self.entries.contains_key(query)
    }

    pub fn remove(&mut self, query: &str) -> Option<Citations> {
        self.entries.remove(query)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn queries(&self) -> impl Iterator<Item = &PaperId> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PaperId, &Citations)> {
        self.entries.iter()
    }

    /// Total number of (query, target) edges
    pub fn edge_count(&self) -> usize {
        self.entries.values().map(|c| c.len()).sum()
    }

    /// Targets of a query that carry direct weight
    pub fn direct_targets<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a PaperId> + 'a {
        self.entries
            .get(query)
            .into_iter()
            .flat_map(|c| c.iter())
            .filter(|(_, w)| w.is_direct())
            .map(|(id, _)| id)
    }

    /// Every paper appearing anywhere in the graph, as source or target
    pub fn all_paper_ids(&self) -> BTreeSet<PaperId> {
        let mut all = BTreeSet::new();
        for (query, citations) in &self.entries {
            all.insert(query.clone());
            all.extend(citations.keys().cloned());
        }
        all
    }
}

impl FromIterator<(PaperId, Citations)> for CitationMap {
    fn from_iter<T: IntoIterator<Item = (PaperId, Citations)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
