//! Flat persisted record of every bound value.
//!
//! A snapshot is a JSON object keyed by binding key in manifest order. It
//! carries no version tag: keys missing from an older profile simply leave the
//! corresponding field at its current value.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::numeric_field::format_value;
use crate::registry::{Binding, FieldRegistry};
use crate::value_field::Transmission;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read profile from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write profile to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse profile: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("profile entry `{key}` should be {expected}")]
    FieldType { key: String, expected: &'static str },
    #[error("profile entry `{key}` names unknown transmission {value:?}")]
    UnknownTransmission { key: String, value: String },
}

/// Counts reported after a snapshot has been applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub written: usize,
    /// Numeric entries holding exactly zero, treated as never captured.
    pub zero_skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(ApplyReport),
    NothingToLoad,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: Map<String, Value>,
}

enum PendingWrite {
    Number(String, f32),
    Flag(String, bool),
    Transmission(String, Transmission),
    Sequence(String, Option<Vec<f32>>),
    OverrideEnabled(String, bool),
    OffsetsEnabled(String, bool),
}

impl Snapshot {
    /// Reads the current value of every binding. Sequences still equal to
    /// their baseline are left out entirely.
    pub fn capture(registry: &FieldRegistry) -> Self {
        let mut entries = Map::new();
        for binding in registry.bindings() {
            match binding {
                Binding::Number(field) => {
                    entries.insert(field.key().to_string(), json_number(field.value()));
                }
                Binding::Flag(field) => {
                    entries.insert(field.key().to_string(), Value::Bool(field.value()));
                }
                Binding::Transmission(field) => {
                    entries.insert(
                        field.key().to_string(),
                        Value::String(field.value().as_str().to_string()),
                    );
                }
                Binding::Sequence(field) => {
                    if field.is_dirty() {
                        let values = field.values().iter().copied().map(json_number).collect();
                        entries.insert(field.key().to_string(), Value::Array(values));
                    }
                }
                Binding::Override(toggle) => {
                    entries.insert(toggle.key().to_string(), Value::Bool(toggle.is_enabled()));
                    let value = toggle.value();
                    entries.insert(value.key().to_string(), json_number(value.value()));
                }
                Binding::Offset(toggle) => {
                    entries.insert(toggle.key().to_string(), Value::Bool(toggle.is_enabled()));
                    for axle in toggle.axles() {
                        let offset = axle.offset();
                        entries.insert(offset.key().to_string(), json_number(offset.value()));
                    }
                }
            }
        }
        Self { entries }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the snapshot into `registry`. Every entry is type-checked
    /// first, so a malformed snapshot leaves the registry untouched.
    pub fn apply(&self, registry: &mut FieldRegistry) -> Result<ApplyReport, SnapshotError> {
        let writes = self.decode(registry)?;
        let mut report = ApplyReport::default();

        for write in writes {
            match write {
                PendingWrite::Number(key, value) => {
                    if let Some(field) = registry.number_mut(&key) {
                        if field.set_directly(value, true).is_changed() {
                            report.written += 1;
                        } else {
                            report.zero_skipped += 1;
                        }
                    }
                }
                PendingWrite::Flag(key, value) => {
                    if let Some(field) = registry.flag_mut(&key) {
                        field.set(value);
                        report.written += 1;
                    }
                }
                PendingWrite::Transmission(key, value) => {
                    if let Some(field) = registry.transmission_mut(&key) {
                        field.set(value);
                        report.written += 1;
                    }
                }
                PendingWrite::Sequence(key, values) => {
                    if let Some(field) = registry.sequence_mut(&key) {
                        match values {
                            Some(values) if !values.is_empty() => {
                                field.replace(values);
                                report.written += 1;
                            }
                            _ => {
                                if field.reset_to_baseline() {
                                    report.written += 1;
                                }
                            }
                        }
                    }
                }
                PendingWrite::OverrideEnabled(key, enabled) => {
                    if let Some(toggle) = registry.override_mut(&key) {
                        toggle.set_enabled(enabled);
                        report.written += 1;
                    }
                }
                PendingWrite::OffsetsEnabled(key, enabled) => {
                    if let Some(toggle) = registry.offsets_mut(&key) {
                        toggle.set_enabled(enabled);
                        report.written += 1;
                    }
                }
            }
        }

        let ignored = self
            .keys()
            .filter(|key| !registry.contains(key) && registry.number(key).is_none());
        for key in ignored {
            debug!(target: "tuner::snapshot", key, "snapshot.entry_ignored=unbound");
        }

        Ok(report)
    }

    fn decode(&self, registry: &FieldRegistry) -> Result<Vec<PendingWrite>, SnapshotError> {
        let mut writes = Vec::with_capacity(self.entries.len());
        for binding in registry.bindings() {
            match binding {
                Binding::Number(field) => {
                    if let Some(value) = self.number(field.key())? {
                        writes.push(PendingWrite::Number(field.key().to_string(), value));
                    }
                }
                Binding::Flag(field) => {
                    if let Some(value) = self.flag(field.key())? {
                        writes.push(PendingWrite::Flag(field.key().to_string(), value));
                    }
                }
                Binding::Transmission(field) => {
                    if let Some(value) = self.transmission(field.key())? {
                        writes.push(PendingWrite::Transmission(field.key().to_string(), value));
                    }
                }
                Binding::Sequence(field) => {
                    let values = self.sequence(field.key())?;
                    writes.push(PendingWrite::Sequence(field.key().to_string(), values));
                }
                Binding::Override(toggle) => {
                    if let Some(enabled) = self.flag(toggle.key())? {
                        writes.push(PendingWrite::OverrideEnabled(
                            toggle.key().to_string(),
                            enabled,
                        ));
                    }
                    let key = toggle.value().key();
                    if let Some(value) = self.number(key)? {
                        writes.push(PendingWrite::Number(key.to_string(), value));
                    }
                }
                Binding::Offset(toggle) => {
                    if let Some(enabled) = self.flag(toggle.key())? {
                        writes.push(PendingWrite::OffsetsEnabled(
                            toggle.key().to_string(),
                            enabled,
                        ));
                    }
                    for axle in toggle.axles() {
                        let key = axle.offset().key();
                        if let Some(value) = self.number(key)? {
                            writes.push(PendingWrite::Number(key.to_string(), value));
                        }
                    }
                }
            }
        }
        Ok(writes)
    }

    fn number(&self, key: &str) -> Result<Option<f32>, SnapshotError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => number_entry(key, value).map(Some),
        }
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, SnapshotError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| type_error(key, "a boolean")),
        }
    }

    fn transmission(&self, key: &str) -> Result<Option<Transmission>, SnapshotError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::String(name)) => name.parse().map(Some).map_err(|value| {
                SnapshotError::UnknownTransmission {
                    key: key.to_string(),
                    value,
                }
            }),
            Some(_) => Err(type_error(key, "a transmission name")),
        }
    }

    fn sequence(&self, key: &str) -> Result<Option<Vec<f32>>, SnapshotError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| number_entry(key, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(type_error(key, "an array of numbers")),
        }
    }
}

/// Narrows a JSON number to `f32`; values outside the `f32` range are
/// rejected rather than becoming infinite.
fn number_entry(key: &str, value: &Value) -> Result<f32, SnapshotError> {
    let wide = value.as_f64().ok_or_else(|| type_error(key, "a number"))?;
    let narrowed = wide as f32;
    if narrowed.is_finite() {
        Ok(narrowed)
    } else {
        Err(type_error(key, "a finite number"))
    }
}

fn type_error(key: &str, expected: &'static str) -> SnapshotError {
    SnapshotError::FieldType {
        key: key.to_string(),
        expected,
    }
}

/// Writes `value` using its shortest round-trip decimal form, so `0.1f32`
/// is persisted as `0.1` rather than its widened binary expansion.
fn json_number(value: f32) -> Value {
    format_value(value)
        .parse::<f64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(f64::from(value)))
}

/// Location of one operator profile on disk.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl AsRef<Path>, filename: &str) -> Self {
        Self {
            path: dir.as_ref().join(filename),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let json = snapshot.to_json_pretty()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SnapshotError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, json).map_err(|source| SnapshotError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(
            target: "tuner::snapshot",
            path = %self.path.display(),
            entries = snapshot.len(),
            "profile.saved"
        );
        Ok(())
    }

    /// `Ok(None)` when no profile has been saved yet.
    pub fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        if !self.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| SnapshotError::Read {
            path: self.path.clone(),
            source,
        })?;
        Snapshot::from_json_str(&contents).map(Some)
    }
}
