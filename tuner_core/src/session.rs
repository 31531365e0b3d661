//! The context object handed to the presentation layer and the frame loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bevy::prelude::Resource;
use tracing::{info, warn};

use crate::live::LiveTargetResolver;
use crate::manifest::TuningManifest;
use crate::numeric_field::{EditOutcome, NumericField};
use crate::override_toggle::ToggleTick;
use crate::registry::FieldRegistry;
use crate::restore::{restore_all, RestoreReport};
use crate::snapshot::{LoadOutcome, Snapshot, SnapshotError, SnapshotStore};
use crate::tuner_config::TunerConfig;
use crate::value_field::Transmission;
use crate::view::TunerView;

const STEP_KEY: &str = "step";

/// One active tuning session: the bound registry, its host and profile.
#[derive(Resource)]
pub struct TunerSession {
    host: Arc<dyn LiveTargetResolver>,
    registry: FieldRegistry,
    store: SnapshotStore,
    step: NumericField,
    config: Arc<TunerConfig>,
}

impl TunerSession {
    pub fn new(
        manifest: &TuningManifest,
        host: Arc<dyn LiveTargetResolver>,
        profile_dir: impl AsRef<Path>,
        config: Arc<TunerConfig>,
    ) -> Self {
        let registry = FieldRegistry::bind(manifest, host.as_ref(), &config);
        let store = SnapshotStore::new(profile_dir, config.profile_filename());
        let step = NumericField::detached(STEP_KEY, "Step", config.step_amount());
        Self {
            host,
            registry,
            store,
            step,
            config,
        }
    }

    pub fn host(&self) -> &dyn LiveTargetResolver {
        self.host.as_ref()
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FieldRegistry {
        &mut self.registry
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn step_amount(&self) -> f32 {
        self.step.value()
    }

    /// Sets the shared "+"/"-" amount from operator text.
    pub fn set_step(&mut self, raw: &str) -> EditOutcome {
        self.step.commit(raw)
    }

    pub fn edit_buffer(&mut self, key: &str, text: &str) -> EditOutcome {
        match self.registry.number_mut(key) {
            Some(field) => {
                field.edit_buffer(text);
                EditOutcome::Unchanged
            }
            None => unbound(key),
        }
    }

    pub fn commit(&mut self, key: &str, raw: &str) -> EditOutcome {
        match self.registry.number_mut(key) {
            Some(field) => field.commit(raw),
            None => unbound(key),
        }
    }

    /// Commits whatever the operator has typed into `key`'s buffer.
    pub fn commit_buffer(&mut self, key: &str) -> EditOutcome {
        match self.registry.number_mut(key) {
            Some(field) => field.commit_buffer(),
            None => unbound(key),
        }
    }

    pub fn increment(&mut self, key: &str) -> EditOutcome {
        let delta = self.step.value();
        self.nudge(key, delta)
    }

    pub fn decrement(&mut self, key: &str) -> EditOutcome {
        let delta = -self.step.value();
        self.nudge(key, delta)
    }

    fn nudge(&mut self, key: &str, delta: f32) -> EditOutcome {
        match self.registry.number_mut(key) {
            Some(field) => field.increment(delta),
            None => unbound(key),
        }
    }

    pub fn set_flag(&mut self, key: &str, value: bool) -> EditOutcome {
        match self.registry.flag_mut(key) {
            Some(field) => changed(field.set(value)),
            None => unbound(key),
        }
    }

    pub fn set_transmission(&mut self, key: &str, value: Transmission) -> EditOutcome {
        match self.registry.transmission_mut(key) {
            Some(field) => changed(field.set(value)),
            None => unbound(key),
        }
    }

    pub fn set_override_enabled(&mut self, key: &str, enabled: bool) -> EditOutcome {
        match self.registry.override_mut(key) {
            Some(toggle) => changed(toggle.set_enabled(enabled)),
            None => unbound(key),
        }
    }

    pub fn set_offsets_enabled(&mut self, key: &str, enabled: bool) -> EditOutcome {
        match self.registry.offsets_mut(key) {
            Some(toggle) => changed(toggle.set_enabled(enabled)),
            None => unbound(key),
        }
    }

    pub fn sequence_add(&mut self, key: &str, at_front: bool) -> EditOutcome {
        match self.registry.sequence_mut(key) {
            Some(field) => {
                field.add(at_front);
                EditOutcome::Changed
            }
            None => unbound(key),
        }
    }

    pub fn sequence_remove(&mut self, key: &str, index: usize) -> EditOutcome {
        match self.registry.sequence_mut(key) {
            Some(field) => changed(field.remove_at(index)),
            None => unbound(key),
        }
    }

    pub fn sequence_commit(&mut self, key: &str, index: usize, raw: &str) -> EditOutcome {
        match self.registry.sequence_mut(key) {
            Some(field) => field.commit_at(index, raw),
            None => unbound(key),
        }
    }

    pub fn sequence_increment(&mut self, key: &str, index: usize, upward: bool) -> EditOutcome {
        let step = self.step.value();
        let delta = if upward { step } else { -step };
        match self.registry.sequence_mut(key) {
            Some(field) => field.increment_at(index, delta),
            None => unbound(key),
        }
    }

    pub fn sequence_reset(&mut self, key: &str) -> EditOutcome {
        match self.registry.sequence_mut(key) {
            Some(field) => changed(field.reset_to_baseline()),
            None => unbound(key),
        }
    }

    pub fn capture(&self) -> Snapshot {
        Snapshot::capture(&self.registry)
    }

    pub fn save(&self) -> Result<PathBuf, SnapshotError> {
        let snapshot = self.capture();
        self.store.save(&snapshot).map_err(|err| {
            warn!(target: "tuner::snapshot", error = %err, "profile.save_failed");
            err
        })?;
        Ok(self.store.path().to_path_buf())
    }

    /// Loads the profile if one exists. A malformed profile is reported and
    /// leaves every field as it was.
    pub fn load(&mut self) -> Result<LoadOutcome, SnapshotError> {
        let loaded = self
            .store
            .load()
            .and_then(|snapshot| match snapshot {
                Some(snapshot) => snapshot.apply(&mut self.registry).map(LoadOutcome::Applied),
                None => Ok(LoadOutcome::NothingToLoad),
            });

        match &loaded {
            Ok(LoadOutcome::Applied(report)) => info!(
                target: "tuner::snapshot",
                path = %self.store.path().display(),
                written = report.written,
                zero_skipped = report.zero_skipped,
                "profile.loaded"
            ),
            Ok(LoadOutcome::NothingToLoad) => info!(
                target: "tuner::snapshot",
                path = %self.store.path().display(),
                "profile.nothing_to_load"
            ),
            Err(err) => warn!(
                target: "tuner::snapshot",
                path = %self.store.path().display(),
                error = %err,
                "profile.load_failed"
            ),
        }
        loaded
    }

    pub fn restore_all(&mut self) -> RestoreReport {
        restore_all(&mut self.registry, self.host.as_ref())
    }

    pub fn tick_overrides(&mut self) -> Vec<ToggleTick> {
        let host = self.host.as_ref();
        self.registry
            .override_toggles_mut()
            .map(|toggle| toggle.tick(host))
            .collect()
    }

    pub fn tick_offsets(&mut self) {
        for toggle in self.registry.offset_toggles_mut() {
            toggle.tick();
        }
    }

    /// Runs one frame outside of a bevy schedule: overrides first, then
    /// offsets.
    pub fn tick(&mut self) {
        self.tick_overrides();
        self.tick_offsets();
    }

    pub fn view(&self) -> TunerView {
        TunerView::build(&self.registry, &self.step)
    }
}

fn changed(changed: bool) -> EditOutcome {
    if changed {
        EditOutcome::Changed
    } else {
        EditOutcome::Unchanged
    }
}

fn unbound(key: &str) -> EditOutcome {
    warn!(target: "tuner::registry", key, "binding.unbound");
    EditOutcome::Unbound
}
