//! Temperature-smoothed field reweighting
//!
//! Each field's target size is `floor(w_f × total)` where
//! `w_f = (n_f / total)^exponent`, normalized so the weights sum to one.
//! Large fields shrink, small fields grow.

use crate::graph::PaperId;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Normalized smoothed weight per field
pub fn smoothed_weights(counts: &BTreeMap<String, usize>, exponent: f64) -> BTreeMap<String, f64> {
    let total: usize = counts.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }
    let raw: BTreeMap<String, f64> = counts
        .iter()
        .map(|(field, n)| (field.clone(), (*n as f64 / total as f64).powf(exponent)))
        .collect();
    let sum: f64 = raw.values().sum();
    raw.into_iter().map(|(field, w)| (field, w / sum)).collect()
}

/// Target size for a field given its normalized weight
pub fn target_size(weight: f64, total: usize) -> usize {
    (weight * total as f64).floor() as usize
}

/// Resample a field's papers to exactly `target` entries
///
/// Shrinking draws without replacement. Growing keeps every paper once, then
/// appends repeated without-replacement draws of at most `ids.len()` papers
/// until the target is reached, so no paper repeats more than necessary.
pub fn resample<R: Rng + ?Sized>(ids: &[PaperId], target: usize, rng: &mut R) -> Vec<PaperId> {
    if ids.is_empty() {
        return Vec::new();
    }
    if target <= ids.len() {
        return ids.choose_multiple(rng, target).cloned().collect();
    }
    let mut out = ids.to_vec();
    let mut remaining = target - ids.len();
    while remaining > 0 {
        let draw = remaining.min(ids.len());
        out.extend(ids.choose_multiple(rng, draw).cloned());
        remaining -= draw;
    }
    out
}
