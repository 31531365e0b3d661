use serde::Serialize;

use crate::numeric_field::NumericField;
use crate::registry::{Binding, FieldRegistry};
use crate::value_field::Transmission;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberView {
    pub key: String,
    pub label: String,
    pub buffer: String,
    pub value: f32,
}

impl NumberView {
    fn of(field: &NumericField) -> Self {
        Self {
            key: field.key().to_string(),
            label: field.label().to_string(),
            buffer: field.buffer().to_string(),
            value: field.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceEntryView {
    pub index: usize,
    pub buffer: String,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowView {
    Number {
        key: String,
        label: String,
        buffer: String,
        value: f32,
        original: f32,
    },
    Flag {
        key: String,
        label: String,
        value: bool,
    },
    Transmission {
        key: String,
        label: String,
        value: Transmission,
    },
    Sequence {
        key: String,
        label: String,
        entries: Vec<SequenceEntryView>,
        dirty: bool,
    },
    Override {
        key: String,
        label: String,
        enabled: bool,
        applied: bool,
        ready: bool,
        value: NumberView,
    },
    Offsets {
        key: String,
        label: String,
        enabled: bool,
        axles: Vec<NumberView>,
    },
}

impl RowView {
    pub fn key(&self) -> &str {
        match self {
            RowView::Number { key, .. }
            | RowView::Flag { key, .. }
            | RowView::Transmission { key, .. }
            | RowView::Sequence { key, .. }
            | RowView::Override { key, .. }
            | RowView::Offsets { key, .. } => key,
        }
    }

    fn of(binding: &Binding) -> Self {
        match binding {
            Binding::Number(field) => RowView::Number {
                key: field.key().to_string(),
                label: field.label().to_string(),
                buffer: field.buffer().to_string(),
                value: field.value(),
                original: field.original(),
            },
            Binding::Flag(field) => RowView::Flag {
                key: field.key().to_string(),
                label: field.label().to_string(),
                value: field.value(),
            },
            Binding::Transmission(field) => RowView::Transmission {
                key: field.key().to_string(),
                label: field.label().to_string(),
                value: field.value(),
            },
            Binding::Sequence(field) => RowView::Sequence {
                key: field.key().to_string(),
                label: field.label().to_string(),
                entries: field
                    .values()
                    .iter()
                    .zip(field.buffers())
                    .enumerate()
                    .map(|(index, (value, buffer))| SequenceEntryView {
                        index,
                        buffer: buffer.clone(),
                        value: *value,
                    })
                    .collect(),
                dirty: field.is_dirty(),
            },
            Binding::Override(toggle) => RowView::Override {
                key: toggle.key().to_string(),
                label: toggle.label().to_string(),
                enabled: toggle.is_enabled(),
                applied: toggle.last_applied(),
                ready: toggle.gate().is_ready(),
                value: NumberView::of(toggle.value()),
            },
            Binding::Offset(toggle) => RowView::Offsets {
                key: toggle.key().to_string(),
                label: toggle.label().to_string(),
                enabled: toggle.is_enabled(),
                axles: toggle
                    .axles()
                    .iter()
                    .map(|axle| NumberView::of(axle.offset()))
                    .collect(),
            },
        }
    }
}

/// Everything a presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TunerView {
    pub step: NumberView,
    pub rows: Vec<RowView>,
}

impl TunerView {
    pub fn build(registry: &FieldRegistry, step: &NumericField) -> Self {
        Self {
            step: NumberView::of(step),
            rows: registry.bindings().iter().map(RowView::of).collect(),
        }
    }

    pub fn row(&self, key: &str) -> Option<&RowView> {
        self.rows.iter().find(|row| row.key() == key)
    }
}
