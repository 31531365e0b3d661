use tracing::info;

use crate::live::LiveTargetResolver;
use crate::override_toggle::ToggleTick;
use crate::registry::{Binding, FieldRegistry};

/// Tally of what one [`restore_all`] pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub fields: usize,
    pub sequences_reset: usize,
    pub overrides_deactivated: usize,
    /// Overrides whose deactivation edge is still pending because the host
    /// could not service it yet.
    pub overrides_pending: usize,
}

/// Returns every field, sequence and toggle to its captured default.
///
/// Plain fields are written back to their originals, dirty sequences are reset
/// to baseline, overrides are forced inactive and offset groups are cleared.
/// Running it a second time changes nothing.
pub fn restore_all(registry: &mut FieldRegistry, host: &dyn LiveTargetResolver) -> RestoreReport {
    let mut report = RestoreReport::default();

    for binding in registry.bindings_mut() {
        match binding {
            Binding::Number(field) => {
                field.restore();
                report.fields += 1;
            }
            Binding::Flag(field) => {
                field.restore();
                report.fields += 1;
            }
            Binding::Transmission(field) => {
                field.restore();
                report.fields += 1;
            }
            Binding::Sequence(field) => {
                if field.reset_to_baseline() {
                    report.sequences_reset += 1;
                }
            }
            Binding::Override(toggle) => {
                toggle.value_mut().restore();
                let was_applied = toggle.last_applied();
                match toggle.deactivate(host) {
                    ToggleTick::Edge { active: false } => report.overrides_deactivated += 1,
                    _ if was_applied => report.overrides_pending += 1,
                    _ => {}
                }
            }
            Binding::Offset(toggle) => toggle.clear(),
        }
    }

    info!(
        target: "tuner::registry",
        fields = report.fields,
        sequences_reset = report.sequences_reset,
        overrides_deactivated = report.overrides_deactivated,
        overrides_pending = report.overrides_pending,
        "registry.restored"
    );
    report
}
