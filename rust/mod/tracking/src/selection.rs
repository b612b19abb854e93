//! Per-bucket unit selection for batch actions.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::progress::Bucket;

/// Aggregate state of the selection, as shown by a header checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    None,
    Some,
    All,
}

/// Which visible units of the active bucket are selected.
#[derive(Debug, Clone)]
pub struct Selection {
    bucket: Bucket,
    chosen: BTreeMap<String, bool>,
}

impl Selection {
    pub fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            chosen: BTreeMap::new(),
        }
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    /// Re-scope to `bucket` showing `visible` ids.
    ///
    /// Switching buckets starts over. Within the same bucket, existing
    /// choices survive for units still visible. Newly seen units default to
    /// selected except in the shipped bucket.
    pub fn sync<'a, I>(&mut self, bucket: Bucket, visible: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        if bucket != self.bucket {
            self.bucket = bucket;
            self.chosen.clear();
        }
        let default = bucket != Bucket::Shipped;
        let previous = std::mem::take(&mut self.chosen);
        self.chosen = visible
            .into_iter()
            .map(|id| (id.to_string(), previous.get(id).copied().unwrap_or(default)))
            .collect();
    }

    /// Flip one unit. Ids that are not visible are ignored.
    pub fn toggle(&mut self, id: &str) {
        if let Some(v) = self.chosen.get_mut(id) {
            *v = !*v;
        }
    }

    pub fn set(&mut self, id: &str, selected: bool) {
        if let Some(v) = self.chosen.get_mut(id) {
            *v = selected;
        }
    }

    pub fn set_all(&mut self, selected: bool) {
        self.chosen.values_mut().for_each(|v| *v = selected);
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.chosen.get(id).copied().unwrap_or(false)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.chosen
            .iter()
            .filter(|&(_, &v)| v)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn tri_state(&self) -> TriState {
        let selected = self.chosen.values().filter(|v| **v).count();
        match selected {
            0 => TriState::None,
            n if n == self.chosen.len() => TriState::All,
            _ => TriState::Some,
        }
    }
}
