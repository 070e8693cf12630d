//! Field Index: subject-field label → query papers carrying it

use super::paper::PaperId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field label → ordered list of query paper IDs
///
/// A paper with several field labels appears in several lists. Fields are
/// kept in lexicographic order so that iteration is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldIndex {
    fields: BTreeMap<String, Vec<PaperId>>,
}

impl FieldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, id: PaperId) {
        self.fields.entry(field.into()).or_default().push(id);
    }

    /// Remove a paper from every field list
    ///
    /// Fields left empty are dropped.
    pub fn remove_paper(&mut self, id: &str) {
        for ids in self.fields.values_mut() {
            ids.retain(|p| p.as_str() != id);
        }
        self.fields.retain(|_, ids| !ids.is_empty());
    }

    /// Append another index's lists after this one's, field by field
    pub fn absorb(&mut self, other: FieldIndex) {
        for (field, ids) in other.fields {
            self.fields.entry(field).or_default().extend(ids);
        }
    }

    pub fn get(&self, field: &str) -> Option<&[PaperId]> {
        self.fields.get(field).map(|v| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<PaperId>)> {
        self.fields.iter()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Sum of list lengths (a paper counts once per field)
    pub fn total_memberships(&self) -> usize {
        self.fields.values().map(|v| v.len()).sum()
    }

    pub fn contains_paper(&self, id: &str) -> bool {
        self.fields.values().any(|ids| ids.iter().any(|p| p.as_str() == id))
    }
}

impl IntoIterator for FieldIndex {
    type Item = (String, Vec<PaperId>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<PaperId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
