//! Field-stratified train/validation/test splitting
//!
//! Each field's query papers are shuffled with one seeded RNG and sliced in
//! the fixed order train, val, test. A paper belonging to several fields is
//! placed by the first field that reaches it; later fields only add to its
//! field membership. The result is a true partition.

mod smoothing;

pub use smoothing::{resample, smoothed_weights, target_size};

use crate::error::{PrepError, PrepResult};
use crate::graph::{FieldIndex, PaperId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Default smoothing exponent for field reweighting
pub const DEFAULT_SMOOTHING_EXPONENT: f64 = 0.7;

/// One of the three output splits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Split proportions and reweighting mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub val_proportion: f64,
    pub test_proportion: f64,
    /// Defaults to the remainder of each field after val and test
    pub train_proportion: Option<f64>,
    /// Resample fields towards a temperature-smoothed distribution
    pub smoothed: bool,
    pub smoothing_exponent: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            val_proportion: 0.2,
            test_proportion: 0.0,
            train_proportion: None,
            smoothed: false,
            smoothing_exponent: DEFAULT_SMOOTHING_EXPONENT,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> PrepResult<()> {
        let named = [
            ("val_proportion", Some(self.val_proportion)),
            ("test_proportion", Some(self.test_proportion)),
            ("train_proportion", self.train_proportion),
        ];
        for (name, value) in named {
            if let Some(p) = value {
                if !(0.0..=1.0).contains(&p) {
                    return Err(PrepError::InvalidProportions(format!(
                        "{} must be within [0, 1], got {}",
                        name, p
                    )));
                }
            }
        }
        let sum = self.val_proportion + self.test_proportion + self.train_proportion.unwrap_or(0.0);
        if sum > 1.0 + 1e-9 {
            return Err(PrepError::InvalidProportions(format!(
                "proportions sum to {} (> 1)",
                sum
            )));
        }
        if self.smoothed && (self.smoothing_exponent.is_nan() || self.smoothing_exponent <= 0.0) {
            return Err(PrepError::InvalidProportions(format!(
                "smoothing_exponent must be positive, got {}",
                self.smoothing_exponent
            )));
        }
        Ok(())
    }

    /// Slice sizes `(train, val, test)` for a field of `len` papers
    pub fn slice_sizes(&self, len: usize) -> (usize, usize, usize) {
        let val = (len as f64 * self.val_proportion).floor() as usize;
        let test = (len as f64 * self.test_proportion).floor() as usize;
        let train = match self.train_proportion {
            Some(p) => (len as f64 * p).floor() as usize,
            None => len.saturating_sub(val + test),
        };
        (train, val, test)
    }
}

/// Split membership of query papers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitAssignment {
    /// Papers per split in write order, each at most once
    pub ids: BTreeMap<Split, Vec<PaperId>>,
    /// Per split: paper → every field it was encountered under
    pub fields: BTreeMap<Split, BTreeMap<PaperId, Vec<String>>>,
    assigned: HashMap<PaperId, Split>,
}

impl SplitAssignment {
    pub fn new() -> Self {
        let mut ids = BTreeMap::new();
        let mut fields = BTreeMap::new();
        for split in Split::ALL {
            ids.insert(split, Vec::new());
            fields.insert(split, BTreeMap::new());
        }
        Self {
            ids,
            fields,
            assigned: HashMap::new(),
        }
    }

    /// Place a paper reached through `field` into `split`
    ///
    /// The first placement wins; the field is recorded under the split the
    /// paper actually belongs to.
    pub fn place(&mut self, id: &PaperId, split: Split, field: &str) {
        let target = match self.assigned.get(id) {
            Some(existing) => *existing,
            None => {
                self.assigned.insert(id.clone(), split);
                self.ids.entry(split).or_default().push(id.clone());
                split
            }
        };
        let fields = self
            .fields
            .entry(target)
            .or_default()
            .entry(id.clone())
            .or_default();
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
    }

    pub fn split_of(&self, id: &str) -> Option<Split> {
        self.assigned.get(id).copied()
    }

    pub fn get(&self, split: Split) -> &[PaperId] {
        self.ids.get(&split).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Field membership keyed by split name, as written to disk
    pub fn fields_by_split(&self) -> BTreeMap<&'static str, &BTreeMap<PaperId, Vec<String>>> {
        self.fields.iter().map(|(s, m)| (s.name(), m)).collect()
    }
}

/// Split the field index into train/val/test
///
/// Deterministic for a given seed, configuration and input ordering.
pub fn stratified_split(fields: &FieldIndex, config: &SplitConfig, seed: u64) -> SplitAssignment {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = SplitAssignment::new();

    let weights = if config.smoothed {
        let counts: BTreeMap<String, usize> = fields
            .iter()
            .map(|(field, ids)| (field.clone(), ids.len()))
            .collect();
        Some((smoothed_weights(&counts, config.smoothing_exponent), fields.total_memberships()))
    } else {
        None
    };

    for (field, ids) in fields.iter() {
        let mut papers = match &weights {
            Some((weights, total)) => {
                let weight = weights.get(field).copied().unwrap_or(0.0);
                resample(ids, target_size(weight, *total), &mut rng)
            }
            None => ids.clone(),
        };
        papers.shuffle(&mut rng);

        let (train, val, test) = config.slice_sizes(papers.len());
        let bounds = [
            (Split::Train, 0, train),
            (Split::Val, train, train + val),
            (Split::Test, train + val, train + val + test),
        ];
        for (split, start, end) in bounds {
            let end = end.min(papers.len());
            let start = start.min(end);
            for id in &papers[start..end] {
                assignment.place(id, split, field);
            }
        }
    }

    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(fields: &[(&str, usize)]) -> FieldIndex {
        let mut index = FieldIndex::new();
        for (field, n) in fields {
            for i in 0..*n {
                index.push(*field, PaperId::new(format!("{}-{}", field, i)));
            }
        }
        index
    }

    #[test]
    fn slice_sizes_default_train_to_remainder() {
        let config = SplitConfig {
            val_proportion: 0.1,
            test_proportion: 0.25,
            ..Default::default()
        };
        assert_eq!(config.slice_sizes(10), (7, 1, 2));

        let explicit = SplitConfig {
            train_proportion: Some(0.5),
            ..config
        };
        assert_eq!(explicit.slice_sizes(10), (5, 1, 2));
    }

    #[test]
    fn validate_rejects_bad_proportions() {
        let over = SplitConfig {
            val_proportion: 0.6,
            test_proportion: 0.6,
            ..Default::default()
        };
        assert!(matches!(over.validate(), Err(PrepError::InvalidProportions(_))));

        let negative = SplitConfig {
            val_proportion: -0.1,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
        assert!(SplitConfig::default().validate().is_ok());
    }

    #[test]
    fn same_seed_same_split() {
        let fields = index(&[("Art", 40), ("Biology", 25)]);
        let config = SplitConfig {
            val_proportion: 0.2,
            test_proportion: 0.2,
            ..Default::default()
        };
        let a = stratified_split(&fields, &config, 321);
        let b = stratified_split(&fields, &config, 321);
        assert_eq!(a, b);

        let c = stratified_split(&fields, &config, 322);
        assert_ne!(a.get(Split::Val), c.get(Split::Val));
    }

    #[test]
    fn multi_field_paper_lands_in_one_split() {
        let mut fields = index(&[("Art", 20), ("History", 20)]);
        for i in 0..10 {
            fields.push("History", PaperId::new(format!("Art-{}", i)));
        }
        let config = SplitConfig {
            val_proportion: 0.3,
            test_proportion: 0.3,
            ..Default::default()
        };
        let assignment = stratified_split(&fields, &config, 5);

        let mut seen = std::collections::HashSet::new();
        for split in Split::ALL {
            for id in assignment.get(split) {
                assert!(seen.insert(id.clone()), "{} written twice", id);
            }
        }
        for i in 0..10 {
            let id = PaperId::new(format!("Art-{}", i));
            let Some(split) = assignment.split_of(id.as_str()) else {
                continue;
            };
            let fields = &assignment.fields[&split][&id];
            assert!(fields.contains(&"Art".to_string()));
        }
    }

    #[test]
    fn smoothed_mode_never_writes_duplicates() {
        let fields = index(&[("Big", 90), ("Small", 5)]);
        let config = SplitConfig {
            val_proportion: 0.2,
            test_proportion: 0.1,
            smoothed: true,
            ..Default::default()
        };
        let assignment = stratified_split(&fields, &config, 11);

        let mut total = 0;
        for split in Split::ALL {
            let ids = assignment.get(split);
            let unique: std::collections::HashSet<_> = ids.iter().collect();
            assert_eq!(unique.len(), ids.len());
            total += ids.len();
        }
        assert_eq!(total, assignment.len());
        // Every small-field paper survives oversampling
        for i in 0..5 {
            assert!(assignment.split_of(&format!("Small-{}", i)).is_some());
        }
    }
}
