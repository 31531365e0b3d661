//! Ordered list of live values, e.g. a gearbox ratio table.
//!
//! The host only accepts whole-array writes, so every mutation pushes the
//! complete list back to the live target.

use tracing::debug;

use crate::live::Live;
use crate::numeric_field::{format_value, parse_value, EditOutcome};

#[derive(Debug, Clone)]
pub struct SequenceField {
    key: String,
    label: String,
    target: Live<Vec<f32>>,
    values: Vec<f32>,
    buffers: Vec<String>,
    baseline: Vec<f32>,
}

impl SequenceField {
    /// Binds `target` and captures its current contents as the baseline.
    pub fn bind(key: impl Into<String>, label: impl Into<String>, target: Live<Vec<f32>>) -> Self {
        let baseline = target.get();
        let buffers = baseline.iter().copied().map(format_value).collect();
        Self {
            key: key.into(),
            label: label.into(),
            target,
            values: baseline.clone(),
            buffers,
            baseline,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn buffers(&self) -> &[String] {
        &self.buffers
    }

    pub fn baseline(&self) -> &[f32] {
        &self.baseline
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.values != self.baseline
    }

    /// Duplicates the neighbouring edge value (or zero for an empty list)
    /// and inserts it at the front or back.
    pub fn add(&mut self, at_front: bool) {
        if at_front {
            let seed = self.values.first().copied().unwrap_or_default();
            self.values.insert(0, seed);
        } else {
            let seed = self.values.last().copied().unwrap_or_default();
            self.values.push(seed);
        }
        self.sync();
    }

    /// Removes the entry at `index`; out-of-range indices are ignored.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.values.len() {
            debug!(
                target: "tuner::registry",
                key = %self.key,
                index,
                len = self.values.len(),
                "sequence.remove_ignored=out_of_range"
            );
            return false;
        }
        self.values.remove(index);
        self.sync();
        true
    }

    pub fn edit_buffer(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.buffers.get_mut(index) {
            Some(buffer) => {
                *buffer = text.into();
                true
            }
            None => false,
        }
    }

    /// Commits operator text for one entry; the whole list is written back.
    pub fn commit_at(&mut self, index: usize, raw: &str) -> EditOutcome {
        if index >= self.values.len() {
            return EditOutcome::Unchanged;
        }
        match parse_value(raw) {
            Some(value) => {
                self.values[index] = value;
                self.sync();
                EditOutcome::Changed
            }
            None => {
                self.buffers[index] = raw.to_string();
                EditOutcome::Unchanged
            }
        }
    }

    pub fn increment_at(&mut self, index: usize, delta: f32) -> EditOutcome {
        match self.values.get(index) {
            Some(value) => {
                let next = format_value(value + delta);
                self.commit_at(index, &next)
            }
            None => EditOutcome::Unchanged,
        }
    }

    /// Returns to the baseline. Does nothing (and reports `false`) when the
    /// list is already clean.
    pub fn reset_to_baseline(&mut self) -> bool {
        if !self.is_dirty() {
            return false;
        }
        self.values = self.baseline.clone();
        self.sync();
        true
    }

    /// Wholesale replacement used by the snapshot loader.
    pub fn replace(&mut self, values: Vec<f32>) {
        self.values = values;
        self.sync();
    }

    fn sync(&mut self) {
        self.buffers = self.values.iter().copied().map(format_value).collect();
        self.target.set(self.values.clone());
    }
}
