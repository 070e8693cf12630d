//! Citation graph structures and the stages that build them

mod builder;
mod citation;
mod fields;
mod indirect;
mod paper;
mod safety;
mod sanitize;

#[cfg(test)]
mod tests;

pub use builder::{build_corpus, CorpusGraph, ShardSlice};
pub use citation::{CitationMap, CitationWeight, Citations, InboundMap};
pub use fields::FieldIndex;
pub use indirect::{expand_all, indirect_for, ExpansionStats};
pub use paper::PaperId;
pub use safety::{SafePaperIndex, ShardStatus};
pub use sanitize::{sanitize_all, sanitize_shard, SanitizedGraph, SanitizedShard};
