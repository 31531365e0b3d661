use bevy::prelude::*;

use crate::session::TunerSession;

/// Frames processed since the app was built.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TunerTick(pub u64);

/// Registers the per-frame tuner systems. Expects a [`TunerSession`]
/// resource to be inserted by the caller.
pub struct TunerPlugin;

impl Plugin for TunerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TunerTick>().add_systems(
            Update,
            (tick_overrides, tick_offsets, advance_tick)
                .chain()
                .run_if(resource_exists::<TunerSession>),
        );
    }
}

/// Edge detection and hook writes happen here, before any continuous writes
/// of later systems in the same frame.
pub fn tick_overrides(mut session: ResMut<TunerSession>) {
    session.tick_overrides();
}

pub fn tick_offsets(mut session: ResMut<TunerSession>) {
    session.tick_offsets();
}

pub fn advance_tick(mut tick: ResMut<TunerTick>) {
    tick.0 = tick.0.wrapping_add(1);
}
