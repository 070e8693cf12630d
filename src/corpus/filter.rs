//! Query-paper candidacy rules applied after eligibility

use super::record::{ExclusionReason, PaperRecord};
use crate::graph::PaperId;
use std::collections::{BTreeSet, HashSet};

/// Restricts which papers may become query papers
#[derive(Debug, Clone)]
pub enum InclusionSet {
    /// Match the record's external (arXiv) identifier, version stripped
    External(HashSet<String>),
    /// Match the record's corpus paper ID
    Papers(HashSet<PaperId>),
}

impl InclusionSet {
    fn admits(&self, record: &PaperRecord) -> bool {
        match self {
            InclusionSet::External(ids) => record
                .arxiv_id
                .as_deref()
                .is_some_and(|a| ids.contains(super::ids::strip_version(a))),
            InclusionSet::Papers(ids) => ids.contains(&record.paper_id),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            InclusionSet::External(ids) => ids.len(),
            InclusionSet::Papers(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decision for an eligible record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryDecision {
    /// Query paper; carries the field labels to index it under
    Included(Vec<String>),
    Excluded(ExclusionReason),
}

/// Query candidacy filter, shared read-only by every shard worker
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Only papers with at least one of these labels (empty = no filter)
    pub fields_of_study: BTreeSet<String>,
    /// Require at least two field labels
    pub cross_domain: bool,
    /// Require inbound citations (co-citation mode)
    pub cocite: bool,
    pub inclusion: Option<InclusionSet>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields_of_study = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn cross_domain(mut self, enabled: bool) -> Self {
        self.cross_domain = enabled;
        self
    }

    pub fn cocite(mut self, enabled: bool) -> Self {
        self.cocite = enabled;
        self
    }

    pub fn with_inclusion(mut self, inclusion: InclusionSet) -> Self {
        self.inclusion = Some(inclusion);
        self
    }

    /// Decide query candidacy for a record that already passed eligibility
    pub fn decide(&self, record: &PaperRecord) -> QueryDecision {
        if !record.has_outbound_citations || record.outbound_citations.is_empty() {
            return QueryDecision::Excluded(ExclusionReason::NoOutboundCitations);
        }
        if self.cocite && (!record.has_inbound_citations || record.inbound_citations.is_empty()) {
            return QueryDecision::Excluded(ExclusionReason::NoInboundCitations);
        }
        let fields = record.fields();
        if self.cross_domain && fields.len() < 2 {
            return QueryDecision::Excluded(ExclusionReason::SingleFieldOnly);
        }
        let indexed: Vec<String> = if self.fields_of_study.is_empty() {
            fields.to_vec()
        } else {
            fields
                .iter()
                .filter(|f| self.fields_of_study.contains(f.as_str()))
                .cloned()
                .collect()
        };
        if indexed.is_empty() {
            return QueryDecision::Excluded(ExclusionReason::OutsideFieldFilter);
        }
        if let Some(inclusion) = &self.inclusion {
            if !inclusion.admits(record) {
                return QueryDecision::Excluded(ExclusionReason::NotInInclusionList);
            }
        }
        QueryDecision::Included(indexed)
    }
}
