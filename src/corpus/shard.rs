//! Shard Reader: one gzip JSON-lines metadata shard → per-shard graph slices

use super::filter::{QueryDecision, QueryFilter};
use super::record::{classify_eligibility, Eligibility, ExclusionReason, PaperRecord, RecordOutcome};
use crate::error::{PrepError, PrepResult};
use crate::graph::{CitationMap, FieldIndex, InboundMap, PaperId, SafePaperIndex, ShardStatus};
use flate2::read::GzDecoder;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default number of shards in a corpus dump
pub const DEFAULT_SHARD_COUNT: usize = 100;

/// Locations of the shard files under a corpus directory
#[derive(Debug, Clone)]
pub struct ShardLayout {
    pub data_dir: PathBuf,
    pub shard_count: usize,
}

impl ShardLayout {
    pub fn new(data_dir: impl Into<PathBuf>, shard_count: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            shard_count,
        }
    }

    /// `<data_dir>/metadata/metadata_<n>.jsonl.gz`
    pub fn metadata_path(&self, shard: usize) -> PathBuf {
        self.data_dir
            .join("metadata")
            .join(format!("metadata_{}.jsonl.gz", shard))
    }

    /// `<data_dir>/pdf_parses/pdf_parses_<n>.jsonl.gz`
    pub fn pdf_parses_path(&self, shard: usize) -> PathBuf {
        self.data_dir
            .join("pdf_parses")
            .join(format!("pdf_parses_{}.jsonl.gz", shard))
    }

    pub fn shards(&self) -> std::ops::Range<usize> {
        0..self.shard_count
    }

    pub fn check_shard(&self, shard: usize) -> PrepResult<()> {
        if shard >= self.shard_count {
            return Err(PrepError::InvalidShard {
                shard,
                shard_count: self.shard_count,
            });
        }
        Ok(())
    }
}

/// Open a gzip JSON-lines file for line-by-line reading
pub fn open_gz_lines(path: &Path) -> PrepResult<impl BufRead> {
    if !path.exists() {
        return Err(PrepError::MissingShard(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
    Ok(BufReader::new(GzDecoder::new(file)))
}

/// Outcome counts for one shard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanStats {
    pub records: usize,
    pub included: usize,
    pub malformed: usize,
    pub excluded: BTreeMap<ExclusionReason, usize>,
}

impl ScanStats {
    fn count(&mut self, outcome: &RecordOutcome) {
        self.records += 1;
        match outcome {
            RecordOutcome::Included => self.included += 1,
            RecordOutcome::ExcludedByRule(reason) => *self.excluded.entry(*reason).or_insert(0) += 1,
            RecordOutcome::Malformed(_) => self.malformed += 1,
        }
    }

    pub fn excluded_total(&self) -> usize {
        self.excluded.values().sum()
    }

    /// Fold another shard's counts into this one
    pub fn absorb(&mut self, other: &ScanStats) {
        self.records += other.records;
        self.included += other.included;
        self.malformed += other.malformed;
        for (reason, n) in &other.excluded {
            *self.excluded.entry(*reason).or_insert(0) += n;
        }
    }
}

/// Everything one shard contributes to the corpus
#[derive(Debug, Clone, Default)]
pub struct ShardScan {
    pub shard: usize,
    /// Query paper → direct citations
    pub citations: CitationMap,
    /// Query paper → inbound citing papers (co-citation mode only)
    pub cited_by: InboundMap,
    /// Query papers in read order
    pub query_ids: Vec<PaperId>,
    pub fields: FieldIndex,
    pub safety: SafePaperIndex,
    /// Titles of every paper seen, eligible or not
    pub titles: HashMap<PaperId, String>,
    /// Field labels of every paper seen
    pub paper_fields: HashMap<PaperId, Vec<String>>,
    /// Outbound citations of every eligible paper (co-citation mode only)
    pub outbound: CitationMap,
    pub stats: ScanStats,
}

impl ShardScan {
    fn new(shard: usize) -> Self {
        Self {
            shard,
            ..Default::default()
        }
    }

    /// Apply one parsed record and return its outcome
    fn apply(&mut self, record: PaperRecord, filter: &QueryFilter) -> RecordOutcome {
        if self.safety.status(record.paper_id.as_str()).is_some() {
            warn!(
                shard = self.shard,
                paper_id = %record.paper_id,
                "duplicate paper id in shard, keeping first occurrence"
            );
            return RecordOutcome::ExcludedByRule(ExclusionReason::DuplicatePaperId);
        }
        if let Some(title) = &record.title {
            self.titles.insert(record.paper_id.clone(), title.clone());
        }
        if !record.fields().is_empty() {
            self.paper_fields
                .insert(record.paper_id.clone(), record.fields().to_vec());
        }

        if let Eligibility::Ineligible(reason) = classify_eligibility(&record) {
            self.safety.record(record.paper_id, ShardStatus::Unsafe);
            return RecordOutcome::ExcludedByRule(reason);
        }
        self.safety
            .record(record.paper_id.clone(), ShardStatus::Safe(self.shard));
        if filter.cocite && !record.outbound_citations.is_empty() {
            self.outbound
                .insert_direct(record.paper_id.clone(), record.outbound_citations.iter().cloned());
        }

        let indexed_fields = match filter.decide(&record) {
            QueryDecision::Included(fields) => fields,
            QueryDecision::Excluded(reason) => return RecordOutcome::ExcludedByRule(reason),
        };

        let id = record.paper_id;
        self.citations
            .insert_direct(id.clone(), record.outbound_citations);
        if filter.cocite {
            self.cited_by.insert(id.clone(), record.inbound_citations);
        }
        for field in indexed_fields {
            self.fields.push(field, id.clone());
        }
        self.query_ids.push(id);
        RecordOutcome::Included
    }
}

/// Scan shard lines from any reader
///
/// Blank lines are skipped. A line that does not parse as a record is
/// counted as malformed; with `strict` it aborts the scan instead.
pub fn scan_reader<R: BufRead>(
    shard: usize,
    reader: R,
    filter: &QueryFilter,
    strict: bool,
    source: &Path,
) -> PrepResult<ShardScan> {
    let mut scan = ShardScan::new(shard);

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| PrepError::io(source, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let outcome = match serde_json::from_str::<PaperRecord>(&line) {
            Ok(record) => scan.apply(record, filter),
            Err(e) => {
                if strict {
                    return Err(PrepError::MalformedRecord {
                        shard,
                        line: i + 1,
                        reason: e.to_string(),
                    });
                }
                warn!(shard, line = i + 1, error = %e, "skipping malformed record");
                RecordOutcome::Malformed(e.to_string())
            }
        };
        scan.stats.count(&outcome);
    }

    debug!(
        shard,
        records = scan.stats.records,
        queries = scan.query_ids.len(),
        malformed = scan.stats.malformed,
        "scanned shard"
    );
    Ok(scan)
}

/// Scan one metadata shard file
pub fn scan_shard(
    layout: &ShardLayout,
    shard: usize,
    filter: &QueryFilter,
    strict: bool,
) -> PrepResult<ShardScan> {
    layout.check_shard(shard)?;
    let path = layout.metadata_path(shard);
    let reader = open_gz_lines(&path)?;
    scan_reader(shard, reader, filter, strict, &path)
}
