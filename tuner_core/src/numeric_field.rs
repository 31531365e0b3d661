use crate::live::Live;

/// Result of an edit request coming from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Changed,
    Unchanged,
    /// No binding with the requested key exists in the registry.
    Unbound,
}

impl EditOutcome {
    pub fn is_changed(self) -> bool {
        matches!(self, EditOutcome::Changed)
    }
}

/// Stable decimal rendering; `parse_value(&format_value(x)) == Some(x)` for
/// every finite `x`.
pub fn format_value(value: f32) -> String {
    value.to_string()
}

/// Parses operator input. Surrounding whitespace is ignored and non-finite
/// results are rejected.
pub fn parse_value(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
}

/// One live numeric value mirrored into an editable text buffer.
#[derive(Debug, Clone)]
pub struct NumericField {
    key: String,
    label: String,
    target: Live<f32>,
    buffer: String,
    original: f32,
}

impl NumericField {
    /// Binds `target`, capturing its current value as the original.
    pub fn bind(key: impl Into<String>, label: impl Into<String>, target: Live<f32>) -> Self {
        let original = target.get();
        let buffer = format_value(original);
        Self {
            key: key.into(),
            label: label.into(),
            target,
            buffer,
            original,
        }
    }

    /// Field backed by an engine-owned cell starting at `initial`.
    pub fn detached(key: impl Into<String>, label: impl Into<String>, initial: f32) -> Self {
        Self::bind(key, label, Live::detached(initial))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> f32 {
        self.target.get()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn original(&self) -> f32 {
        self.original
    }

    pub fn target(&self) -> &Live<f32> {
        &self.target
    }

    /// Replaces the buffer while the operator is typing; nothing is parsed.
    pub fn edit_buffer(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    /// Commits `raw`. Malformed input stays in the buffer so it can be
    /// corrected, and the live value is left alone.
    pub fn commit(&mut self, raw: &str) -> EditOutcome {
        match parse_value(raw) {
            Some(value) => {
                self.write(value);
                EditOutcome::Changed
            }
            None => {
                self.buffer = raw.to_string();
                EditOutcome::Unchanged
            }
        }
    }

    /// Commits whatever is currently in the buffer (enter pressed or focus lost).
    pub fn commit_buffer(&mut self) -> EditOutcome {
        let raw = self.buffer.clone();
        self.commit(&raw)
    }

    pub fn increment(&mut self, delta: f32) -> EditOutcome {
        let next = self.value() + delta;
        self.commit(&format_value(next))
    }

    pub fn restore(&mut self) {
        self.write(self.original);
    }

    /// Programmatic write used by the snapshot loader. With `skip_zero` an
    /// exact zero is treated as "never captured" and ignored.
    pub fn set_directly(&mut self, value: f32, skip_zero: bool) -> EditOutcome {
        if skip_zero && value == 0.0 {
            return EditOutcome::Unchanged;
        }
        self.write(value);
        EditOutcome::Changed
    }

    fn write(&mut self, value: f32) {
        self.target.set(value);
        self.buffer = format_value(value);
    }
}
