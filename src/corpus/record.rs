//! Paper records as they appear in metadata shards

use crate::graph::PaperId;
use serde::{Deserialize, Serialize};

/// One line of a metadata shard
///
/// Only the fields the pipeline reads are modeled; anything else in the
/// record is ignored. Booleans and lists that are absent deserialize as
/// `false` / empty.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperRecord {
    pub paper_id: PaperId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub mag_field_of_study: Option<Vec<String>>,
    #[serde(default)]
    pub has_outbound_citations: bool,
    #[serde(default)]
    pub has_inbound_citations: bool,
    #[serde(default)]
    pub has_pdf_parse: bool,
    #[serde(default)]
    pub has_pdf_parsed_abstract: bool,
    #[serde(default)]
    pub outbound_citations: Vec<PaperId>,
    #[serde(default)]
    pub inbound_citations: Vec<PaperId>,
    #[serde(default)]
    pub arxiv_id: Option<String>,
}

impl PaperRecord {
    /// Field-of-study labels, empty when the record has none
    pub fn fields(&self) -> &[String] {
        self.mag_field_of_study.as_deref().unwrap_or(&[])
    }
}

/// Why a record was not used as a query paper
///
/// The first three variants also mark the paper unsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    MissingFieldOfStudy,
    MissingPdfParse,
    MissingParsedAbstract,
    NoOutboundCitations,
    NoInboundCitations,
    SingleFieldOnly,
    OutsideFieldFilter,
    NotInInclusionList,
    DuplicatePaperId,
}

impl ExclusionReason {
    /// Whether this reason makes the paper ineligible as any graph node
    pub fn marks_unsafe(&self) -> bool {
        matches!(
            self,
            ExclusionReason::MissingFieldOfStudy
                | ExclusionReason::MissingPdfParse
                | ExclusionReason::MissingParsedAbstract
        )
    }
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ExclusionReason::MissingFieldOfStudy => "missing field of study",
            ExclusionReason::MissingPdfParse => "missing pdf parse",
            ExclusionReason::MissingParsedAbstract => "missing parsed abstract",
            ExclusionReason::NoOutboundCitations => "no outbound citations",
            ExclusionReason::NoInboundCitations => "no inbound citations",
            ExclusionReason::SingleFieldOnly => "single field only",
            ExclusionReason::OutsideFieldFilter => "outside field filter",
            ExclusionReason::NotInInclusionList => "not in inclusion list",
            ExclusionReason::DuplicatePaperId => "duplicate paper id",
        };
        f.write_str(label)
    }
}

/// Whether a paper has the metadata needed to appear anywhere in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(ExclusionReason),
}

/// Check eligibility in order: field labels, PDF parse, parsed abstract
pub fn classify_eligibility(record: &PaperRecord) -> Eligibility {
    if record.fields().is_empty() {
        Eligibility::Ineligible(ExclusionReason::MissingFieldOfStudy)
    } else if !record.has_pdf_parse {
        Eligibility::Ineligible(ExclusionReason::MissingPdfParse)
    } else if !record.has_pdf_parsed_abstract {
        Eligibility::Ineligible(ExclusionReason::MissingParsedAbstract)
    } else {
        Eligibility::Eligible
    }
}

/// Outcome of reading one shard line
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Became a query paper of this shard
    Included,
    /// Parsed, but excluded from query candidacy
    ExcludedByRule(ExclusionReason),
    /// The line could not be parsed as a record
    Malformed(String),
}
