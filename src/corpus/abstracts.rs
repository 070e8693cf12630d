//! Title/abstract extraction from PDF-parse shards for the papers in a graph

use super::shard::{open_gz_lines, ShardLayout};
use crate::error::{PrepError, PrepResult};
use crate::graph::{PaperId, SafePaperIndex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info, warn};

/// One paragraph of a parsed abstract
#[derive(Debug, Clone, Deserialize)]
struct Paragraph {
    #[serde(default)]
    text: String,
}

/// The part of a PDF-parse record this stage reads
#[derive(Debug, Clone, Deserialize)]
struct PdfParse {
    paper_id: PaperId,
    #[serde(default, rename = "abstract")]
    abstract_paragraphs: Vec<Paragraph>,
}

/// Title and abstract of one paper, as written to `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperText {
    pub paper_id: PaperId,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// Result of an extraction run
#[derive(Debug, Clone, Default)]
pub struct AbstractCollection {
    pub papers: BTreeMap<PaperId, PaperText>,
    /// Requested papers whose abstract was not found
    pub missing: Vec<PaperId>,
}

/// Extract abstracts for the papers of one shard from a PDF-parse reader
pub fn scan_pdf_parses<R: BufRead>(
    reader: R,
    wanted: &HashSet<PaperId>,
    titles: &HashMap<PaperId, String>,
    source: &Path,
) -> PrepResult<BTreeMap<PaperId, PaperText>> {
    let mut found = BTreeMap::new();
    for line in reader.lines() {
        let line = line.map_err(|e| PrepError::io(source, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let parse: PdfParse = match serde_json::from_str(&line) {
            Ok(p) => p,
            Err(e) => {
                warn!(source = %source.display(), error = %e, "skipping malformed pdf parse");
                continue;
            }
        };
        if !wanted.contains(&parse.paper_id) {
            continue;
        }
        let Some(first) = parse.abstract_paragraphs.first() else {
            continue;
        };
        let title = titles.get(&parse.paper_id).cloned().unwrap_or_default();
        found.insert(
            parse.paper_id.clone(),
            PaperText {
                paper_id: parse.paper_id,
                title,
                abstract_text: first.text.clone(),
            },
        );
    }
    Ok(found)
}

/// Collect title/abstract pairs for `paper_ids`, one task per shard
///
/// Papers are routed to their shard through the safe index; papers without a
/// shard are reported as missing.
pub fn collect_abstracts(
    layout: &ShardLayout,
    paper_ids: &[PaperId],
    safety: &SafePaperIndex,
    titles: &HashMap<PaperId, String>,
) -> PrepResult<AbstractCollection> {
    let mut by_shard: BTreeMap<usize, HashSet<PaperId>> = BTreeMap::new();
    let mut missing = Vec::new();
    for id in paper_ids {
        match safety.shard_of(id.as_str()) {
            Some(shard) => {
                by_shard.entry(shard).or_default().insert(id.clone());
            }
            None => {
                warn!(paper_id = %id, "paper has no safe shard, skipping abstract lookup");
                missing.push(id.clone());
            }
        }
    }

    let shards: Vec<(usize, HashSet<PaperId>)> = by_shard.into_iter().collect();
    let results: Vec<BTreeMap<PaperId, PaperText>> = shards
        .par_iter()
        .map(|(shard, wanted)| -> PrepResult<BTreeMap<PaperId, PaperText>> {
            layout.check_shard(*shard)?;
            let path = layout.pdf_parses_path(*shard);
            let reader = open_gz_lines(&path)?;
            let found = scan_pdf_parses(reader, wanted, titles, &path)?;
            debug!(shard, wanted = wanted.len(), found = found.len(), "scanned pdf parses");
            Ok(found)
        })
        .collect::<PrepResult<_>>()?;

    let mut papers = BTreeMap::new();
    for found in results {
        papers.extend(found);
    }
    for (_, wanted) in &shards {
        missing.extend(wanted.iter().filter(|id| !papers.contains_key(*id)).cloned());
    }
    missing.sort();

    if !missing.is_empty() {
        warn!(missing = missing.len(), "papers without an extracted abstract");
    }
    info!(papers = papers.len(), "collected abstracts");
    Ok(AbstractCollection { papers, missing })
}
