//! Live parameter binding and override persistence for a running vehicle
//! simulation.
//!
//! A [`TuningManifest`] is resolved against a [`LiveTargetResolver`] into a
//! [`FieldRegistry`]; the [`TunerSession`] wraps the registry for the
//! presentation layer and the bevy frame loop built by [`build_tuner_app`].

pub mod host;
pub mod live;
pub mod manifest;
mod numeric_field;
mod offset_toggle;
mod override_toggle;
mod readiness;
mod registry;
mod restore;
mod sequence_field;
mod session;
pub mod snapshot;
mod systems;
pub mod tuner_config;
mod value_field;
pub mod view;

use bevy::prelude::*;

pub use host::InMemoryHost;
pub use live::{HookSwitch, Live, LiveTargetResolver};
pub use manifest::{vehicle_manifest, BindingKind, BindingSpec, OverrideSpec, TuningManifest};
pub use numeric_field::{format_value, parse_value, EditOutcome, NumericField};
pub use offset_toggle::{AxleOffset, OffsetToggle};
pub use override_toggle::{OverrideToggle, ToggleTick};
pub use readiness::{GateStatus, ReadinessGate};
pub use registry::{Binding, FieldRegistry};
pub use restore::{restore_all, RestoreReport};
pub use sequence_field::SequenceField;
pub use session::TunerSession;
pub use snapshot::{ApplyReport, LoadOutcome, Snapshot, SnapshotError, SnapshotStore};
pub use systems::{TunerPlugin, TunerTick};
pub use tuner_config::{
    load_tuner_config, load_tuner_config_from_env, TunerConfig, TunerConfigError,
    TunerConfigSource,
};
pub use value_field::{FlagField, Transmission, TransmissionField, ValueField};
pub use view::{RowView, TunerView};

/// Construct a Bevy [`App`] that ticks `session` once per update.
pub fn build_tuner_app(session: TunerSession) -> App {
    let mut app = App::new();
    app.insert_resource(session)
        .add_plugins(MinimalPlugins)
        .add_plugins(TunerPlugin);
    app
}

/// Execute a single frame.
///
/// Each call processes the chained systems registered by [`TunerPlugin`]
/// (overrides → offsets → tick increment). Callers handle operator commands
/// between frames through the [`TunerSession`] resource.
pub fn run_tick(app: &mut App) {
    app.update();
}
