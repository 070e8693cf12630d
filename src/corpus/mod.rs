//! Reading the sharded paper corpus
//!
//! Metadata shards are gzip-compressed JSON lines. Each shard is scanned
//! independently into a [`ShardScan`]; nothing here touches shared state.

mod abstracts;
mod filter;
mod ids;
mod record;
mod shard;

pub use abstracts::{collect_abstracts, scan_pdf_parses, AbstractCollection, PaperText};
pub use filter::{InclusionSet, QueryDecision, QueryFilter};
pub use ids::{load_id_list, strip_version, IdMapping};
pub use record::{classify_eligibility, Eligibility, ExclusionReason, PaperRecord, RecordOutcome};
pub use shard::{
    open_gz_lines, scan_reader, scan_shard, ScanStats, ShardLayout, ShardScan, DEFAULT_SHARD_COUNT,
};
