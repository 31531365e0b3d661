use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::live::Live;

/// Driven axles of the vehicle drivetrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Transmission {
    #[default]
    #[serde(rename = "FWD")]
    Fwd,
    #[serde(rename = "RWD")]
    Rwd,
    #[serde(rename = "AWD")]
    Awd,
}

impl Transmission {
    pub const ALL: [Transmission; 3] = [Transmission::Fwd, Transmission::Rwd, Transmission::Awd];

    pub fn as_str(self) -> &'static str {
        match self {
            Transmission::Fwd => "FWD",
            Transmission::Rwd => "RWD",
            Transmission::Awd => "AWD",
        }
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transmission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Transmission::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

/// A live non-numeric setting (flag or choice) with its captured original.
#[derive(Debug, Clone)]
pub struct ValueField<T> {
    key: String,
    label: String,
    target: Live<T>,
    original: T,
}

impl<T: Copy + PartialEq> ValueField<T> {
    pub fn bind(key: impl Into<String>, label: impl Into<String>, target: Live<T>) -> Self {
        let original = target.get();
        Self {
            key: key.into(),
            label: label.into(),
            target,
            original,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> T {
        self.target.get()
    }

    pub fn original(&self) -> T {
        self.original
    }

    /// Returns `true` when the live value actually changed.
    pub fn set(&mut self, value: T) -> bool {
        self.target.replace(value) != value
    }

    pub fn restore(&mut self) -> bool {
        self.set(self.original)
    }
}

pub type FlagField = ValueField<bool>;
pub type TransmissionField = ValueField<Transmission>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transmission_parses_case_insensitively() {
        assert_eq!("rwd".parse::<Transmission>(), Ok(Transmission::Rwd));
        assert_eq!(" AWD ".parse::<Transmission>(), Ok(Transmission::Awd));
        assert!("4x4".parse::<Transmission>().is_err());
    }

    #[test]
    fn transmission_serializes_by_axle_name() {
        let json = serde_json::to_string(&Transmission::Rwd).unwrap();
        assert_eq!(json, "\"RWD\"");
        let back: Transmission = serde_json::from_str("\"AWD\"").unwrap();
        assert_eq!(back, Transmission::Awd);
    }

    #[test]
    fn flag_set_reports_real_changes_and_restores() {
        let live = Live::new(false);
        let mut field = FlagField::bind("abs", "ABS", live.clone());
        assert!(field.set(true));
        assert!(!field.set(true));
        assert!(live.get());
        assert!(field.restore());
        assert!(!live.get());
        assert!(!field.restore());
    }
}
