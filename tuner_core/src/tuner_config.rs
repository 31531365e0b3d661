use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_TUNER_CONFIG: &str = include_str!("data/tuner_config.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    step_amount: f32,
    profile_filename: String,
    load_on_start: bool,
    save_on_exit: bool,
    #[serde(rename = "override")]
    override_: OverrideConfig,
    readiness: ReadinessConfig,
}

impl TunerConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_TUNER_CONFIG).expect("builtin tuner config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, TunerConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| TunerConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let config = TunerConfig::from_json_str(&contents)?;
        Ok(config)
    }

    /// Initial size of the shared "+"/"-" stepper amount.
    pub fn step_amount(&self) -> f32 {
        self.step_amount
    }

    pub fn profile_filename(&self) -> &str {
        &self.profile_filename
    }

    pub fn load_on_start(&self) -> bool {
        self.load_on_start
    }

    pub fn save_on_exit(&self) -> bool {
        self.save_on_exit
    }

    pub fn override_config(&self) -> &OverrideConfig {
        &self.override_
    }

    pub fn readiness(&self) -> &ReadinessConfig {
        &self.readiness
    }
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            step_amount: 0.01,
            profile_filename: "tuner_profile.json".to_string(),
            load_on_start: true,
            save_on_exit: false,
            override_: OverrideConfig::default(),
            readiness: ReadinessConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TunerConfigError {
    #[error("failed to parse tuner config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read tuner config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    floor: f32,
    neutral: f32,
}

impl OverrideConfig {
    /// Lowest value an active override may push into the host.
    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Value restored to the host when an override deactivates.
    pub fn neutral(&self) -> f32 {
        self.neutral
    }
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            floor: 0.1,
            neutral: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    poll_interval_ticks: u64,
    timeout_ticks: Option<u64>,
}

impl ReadinessConfig {
    pub fn new(poll_interval_ticks: u64, timeout_ticks: Option<u64>) -> Self {
        Self {
            poll_interval_ticks,
            timeout_ticks,
        }
    }

    pub fn poll_interval_ticks(&self) -> u64 {
        self.poll_interval_ticks
    }

    /// `None` waits for readiness indefinitely.
    pub fn timeout_ticks(&self) -> Option<u64> {
        self.timeout_ticks
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self::new(1, None)
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunerConfigSource {
    File(PathBuf),
    Builtin,
}

pub fn load_tuner_config_from_env() -> (Arc<TunerConfig>, TunerConfigSource) {
    let override_path = env::var("TUNER_CONFIG_PATH").ok().map(PathBuf::from);
    load_tuner_config(override_path.as_deref())
}

/// Loads `path` when given, falling back to the builtin config on any failure.
pub fn load_tuner_config(path: Option<&Path>) -> (Arc<TunerConfig>, TunerConfigSource) {
    if let Some(path) = path {
        match TunerConfig::from_file(path) {
            Ok(config) => {
                tracing::info!(
                    target: "tuner::config",
                    path = %path.display(),
                    "tuner_config.loaded=file"
                );
                return (
                    Arc::new(config),
                    TunerConfigSource::File(path.to_path_buf()),
                );
            }
            Err(err) => {
                tracing::warn!(
                    target: "tuner::config",
                    path = %path.display(),
                    error = %err,
                    "tuner_config.load_failed"
                );
            }
        }
    }

    let config = TunerConfig::builtin();
    tracing::info!(target: "tuner::config", "tuner_config.loaded=builtin");
    (config, TunerConfigSource::Builtin)
}
