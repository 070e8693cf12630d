//! Safe-Paper Index: which papers may appear as graph nodes

use super::paper::PaperId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Eligibility of a paper, as recorded by the shard it was read from
///
/// Serialized as the shard number, or `-1` when the paper is unsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ShardStatus {
    /// Complete metadata, found in the given shard
    Safe(usize),
    /// Missing field labels, PDF parse, or parsed abstract
    Unsafe,
}

impl ShardStatus {
    pub fn is_safe(&self) -> bool {
        matches!(self, ShardStatus::Safe(_))
    }

    pub fn shard(&self) -> Option<usize> {
        match self {
            ShardStatus::Safe(shard) => Some(*shard),
            ShardStatus::Unsafe => None,
        }
    }
}

impl From<i64> for ShardStatus {
    fn from(raw: i64) -> Self {
        if raw < 0 {
            ShardStatus::Unsafe
        } else {
            ShardStatus::Safe(raw as usize)
        }
    }
}

impl From<ShardStatus> for i64 {
    fn from(status: ShardStatus) -> Self {
        match status {
            ShardStatus::Safe(shard) => shard as i64,
            ShardStatus::Unsafe => -1,
        }
    }
}

/// Paper ID → shard status for every paper seen in the corpus
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SafePaperIndex {
    statuses: HashMap<PaperId, ShardStatus>,
}

impl SafePaperIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: PaperId, status: ShardStatus) {
        self.statuses.insert(id, status);
    }

    /// Union with another index; colliding keys take the other index's value
    pub fn absorb(&mut self, other: SafePaperIndex) {
        self.statuses.extend(other.statuses);
    }

    /// Papers never seen in any shard are not safe
    pub fn is_safe(&self, id: &str) -> bool {
        self.statuses.get(id).is_some_and(|s| s.is_safe())
    }

    pub fn status(&self, id: &str) -> Option<ShardStatus> {
        self.statuses.get(id).copied()
    }

    pub fn shard_of(&self, id: &str) -> Option<usize> {
        self.status(id).and_then(|s| s.shard())
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn safe_count(&self) -> usize {
        self.statuses.values().filter(|s| s.is_safe()).count()
    }

    /// Entries in paper ID order, for stable output
    pub fn sorted(&self) -> BTreeMap<&PaperId, ShardStatus> {
        self.statuses.iter().map(|(id, s)| (id, *s)).collect()
    }
}
