//! External identifier lists and ID-namespace mappings

use crate::error::{PrepError, PrepResult};
use crate::graph::PaperId;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Strip a trailing version suffix such as `v3` from an identifier
///
/// `1706.03762v5` → `1706.03762`. Identifiers without a numeric version
/// suffix are returned unchanged.
pub fn strip_version(id: &str) -> &str {
    if let Some(pos) = id.rfind('v') {
        let suffix = &id[pos + 1..];
        if pos > 0 && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            return &id[..pos];
        }
    }
    id
}

/// Read a list of external identifiers, one per line
///
/// Only the first tab-separated column is used, a leading `id` header is
/// skipped, and version suffixes are stripped.
pub fn load_id_list(path: &Path) -> PrepResult<HashSet<String>> {
    let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
    read_id_list(BufReader::new(file)).map_err(|e| PrepError::io(path, e))
}

fn read_id_list<R: BufRead>(reader: R) -> std::io::Result<HashSet<String>> {
    let mut ids = HashSet::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let first = line.split('\t').next().unwrap_or("").trim();
        if first.is_empty() || (i == 0 && first == "id") {
            continue;
        }
        ids.insert(strip_version(first).to_string());
    }
    Ok(ids)
}

/// Mapping from an external ID namespace to corpus paper IDs
#[derive(Debug, Clone, Default)]
pub struct IdMapping {
    external_to_paper: HashMap<String, PaperId>,
}

impl IdMapping {
    /// Load a two-column TSV: `external_id<TAB>paper_id`
    pub fn load(path: &Path) -> PrepResult<Self> {
        let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
        Self::from_reader(BufReader::new(file)).map_err(|e| PrepError::io(path, e))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut external_to_paper = HashMap::new();
        for line in reader.lines() {
            let line = line?;
            let mut cols = line.split('\t');
            if let (Some(external), Some(paper)) = (cols.next(), cols.next()) {
                let (external, paper) = (external.trim(), paper.trim());
                if !external.is_empty() && !paper.is_empty() {
                    external_to_paper.insert(strip_version(external).to_string(), PaperId::from(paper));
                }
            }
        }
        Ok(Self { external_to_paper })
    }

    pub fn len(&self) -> usize {
        self.external_to_paper.len()
    }

    pub fn is_empty(&self) -> bool {
        self.external_to_paper.is_empty()
    }

    /// Translate external IDs to paper IDs; returns the set and the miss count
    pub fn translate(&self, external: &HashSet<String>) -> (HashSet<PaperId>, usize) {
        let mut found = HashSet::new();
        let mut misses = 0;
        for id in external {
            match self.external_to_paper.get(id) {
                Some(paper) => {
                    found.insert(paper.clone());
                }
                None => misses += 1,
            }
        }
        (found, misses)
    }
}
