//! Boolean-gated override of a derived host value.
//!
//! Edge actions (flipping dependent hooks, pushing the override or neutral
//! value) run exactly once per transition. While active, the clamped override
//! amount is written into the live target on every tick.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::live::{HookSwitch, Live, LiveTargetResolver};
use crate::manifest::OverrideSpec;
use crate::numeric_field::NumericField;
use crate::readiness::{GateStatus, ReadinessGate};
use crate::tuner_config::{OverrideConfig, ReadinessConfig};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleTick {
    /// Target, hooks or subsystems unavailable; nothing was touched.
    Skipped,
    /// Inactive and converged.
    Idle,
    /// An edge was processed this tick.
    Edge { active: bool },
    /// Active and converged; the override amount was re-applied.
    Holding,
}

struct ResolvedHook {
    path: &'static str,
    switch: Arc<dyn HookSwitch>,
}

pub struct OverrideToggle {
    key: String,
    label: String,
    enabled: bool,
    last_applied: bool,
    value: NumericField,
    target: Option<Live<f32>>,
    hook_paths: &'static [&'static str],
    hooks: Option<Vec<ResolvedHook>>,
    missing_hook_reported: bool,
    gate: ReadinessGate,
    floor: f32,
    neutral: f32,
}

impl OverrideToggle {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        spec: &OverrideSpec,
        target: Option<Live<f32>>,
        override_config: &OverrideConfig,
        readiness: &ReadinessConfig,
    ) -> Self {
        let key = key.into();
        let gate = ReadinessGate::new(
            key.clone(),
            spec.ready.iter().map(|name| name.to_string()).collect(),
            readiness,
        );
        Self {
            label: label.into(),
            enabled: false,
            last_applied: false,
            value: NumericField::detached(spec.value_key, spec.value_label, spec.default_value),
            target,
            hook_paths: spec.hooks,
            hooks: None,
            missing_hook_reported: false,
            gate,
            floor: override_config.floor(),
            neutral: override_config.neutral(),
            key,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The state the host was last converged to.
    pub fn last_applied(&self) -> bool {
        self.last_applied
    }

    pub fn value(&self) -> &NumericField {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut NumericField {
        &mut self.value
    }

    pub fn target(&self) -> Option<&Live<f32>> {
        self.target.as_ref()
    }

    pub fn hooks_resolved(&self) -> bool {
        self.hooks.is_some()
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    /// Requests a state; the host sees the change on the next serviceable tick.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }

    pub fn tick(&mut self, host: &dyn LiveTargetResolver) -> ToggleTick {
        if !self.ensure_hooks(host) {
            return ToggleTick::Skipped;
        }
        if !self.gate.subsystems_active(host) {
            return ToggleTick::Skipped;
        }
        let (Some(target), Some(hooks)) = (self.target.as_ref(), self.hooks.as_ref()) else {
            return ToggleTick::Skipped;
        };

        let mut outcome = if self.enabled {
            ToggleTick::Holding
        } else {
            ToggleTick::Idle
        };

        if self.enabled != self.last_applied {
            for hook in hooks {
                hook.switch.set_enabled(!self.enabled);
            }
            let pushed = if self.enabled {
                clamp_to_floor(&mut self.value, self.floor)
            } else {
                self.neutral
            };
            target.set(pushed);
            self.last_applied = self.enabled;
            info!(
                target: "tuner::override",
                key = %self.key,
                active = self.enabled,
                value = pushed,
                hooks = hooks.len(),
                "override.edge_applied"
            );
            outcome = ToggleTick::Edge {
                active: self.enabled,
            };
        }

        if self.enabled {
            let value = clamp_to_floor(&mut self.value, self.floor);
            target.set(value);
        }

        outcome
    }

    /// Forces the toggle inactive and processes the deactivation edge now
    /// when the host allows it.
    pub fn deactivate(&mut self, host: &dyn LiveTargetResolver) -> ToggleTick {
        self.enabled = false;
        if self.last_applied {
            self.tick(host)
        } else {
            ToggleTick::Idle
        }
    }

    fn ensure_hooks(&mut self, host: &dyn LiveTargetResolver) -> bool {
        if self.hooks.is_some() {
            return true;
        }
        match self.gate.poll(host) {
            GateStatus::Ready => {}
            GateStatus::Waiting | GateStatus::Overdue => return false,
        }

        let mut resolved = Vec::with_capacity(self.hook_paths.len());
        for &path in self.hook_paths {
            match host.hook(path) {
                Some(switch) => resolved.push(ResolvedHook { path, switch }),
                None => {
                    if !self.missing_hook_reported {
                        self.missing_hook_reported = true;
                        warn!(
                            target: "tuner::override",
                            key = %self.key,
                            hook = %path,
                            "override.hook_missing"
                        );
                    }
                    return false;
                }
            }
        }
        debug!(
            target: "tuner::override",
            key = %self.key,
            hooks = ?resolved.iter().map(|hook| hook.path).collect::<Vec<_>>(),
            "override.hooks_resolved"
        );
        self.hooks = Some(resolved);
        true
    }
}

/// Raises the override amount to `floor` if needed, keeping the field's
/// buffer in step, and returns the value to apply.
fn clamp_to_floor(value: &mut NumericField, floor: f32) -> f32 {
    if value.value() < floor {
        value.set_directly(floor, false);
    }
    value.value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;
    use crate::manifest::{POWER_MULTIPLIER_HOOKS, POWER_MULTIPLIER_SUBSYSTEMS};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SPEC: OverrideSpec = OverrideSpec {
        value_key: "power_multiplier_override",
        value_label: "Power Multiplier",
        default_value: 1.0,
        hooks: POWER_MULTIPLIER_HOOKS,
        ready: POWER_MULTIPLIER_SUBSYSTEMS,
    };

    #[derive(Default)]
    struct CountingHook {
        enabled: parking_lot::Mutex<bool>,
        disables: AtomicUsize,
        enables: AtomicUsize,
    }

    impl HookSwitch for CountingHook {
        fn set_enabled(&self, enabled: bool) {
            *self.enabled.lock() = enabled;
            let counter = if enabled { &self.enables } else { &self.disables };
            counter.fetch_add(1, Ordering::SeqCst);
        }

        fn is_enabled(&self) -> bool {
            *self.enabled.lock()
        }
    }

    struct Fixture {
        host: InMemoryHost,
        target: Live<f32>,
        counters: Vec<Arc<CountingHook>>,
        toggle: OverrideToggle,
    }

    fn fixture(ready: bool) -> Fixture {
        let host = InMemoryHost::new();
        let target = host.insert_float("drivetrain/power_multiplier", 1.0);
        let counters: Vec<_> = POWER_MULTIPLIER_HOOKS
            .iter()
            .map(|path| {
                let hook = Arc::new(CountingHook::default());
                *hook.enabled.lock() = true;
                host.insert_hook_switch(*path, hook.clone());
                hook
            })
            .collect();
        for subsystem in POWER_MULTIPLIER_SUBSYSTEMS {
            host.set_ready(*subsystem, ready);
        }
        let toggle = OverrideToggle::new(
            "power_multiplier_override_enabled",
            "Override Power Multiplier",
            &SPEC,
            host.float("drivetrain/power_multiplier"),
            &OverrideConfig::default(),
            &ReadinessConfig::default(),
        );
        Fixture {
            host,
            target,
            counters,
            toggle,
        }
    }

    fn total(counters: &[Arc<CountingHook>], pick: fn(&CountingHook) -> usize) -> usize {
        counters.iter().map(|hook| pick(hook)).sum()
    }

    fn disables(hook: &CountingHook) -> usize {
        hook.disables.load(Ordering::SeqCst)
    }

    fn enables(hook: &CountingHook) -> usize {
        hook.enables.load(Ordering::SeqCst)
    }

    #[test]
    fn activation_disables_hooks_once_across_many_ticks() {
        let mut fx = fixture(true);
        assert_eq!(fx.toggle.tick(&fx.host), ToggleTick::Idle);

        fx.toggle.value_mut().commit("1.8");
        fx.toggle.set_enabled(true);
        assert_eq!(
            fx.toggle.tick(&fx.host),
            ToggleTick::Edge { active: true }
        );
        for _ in 0..30 {
            assert_eq!(fx.toggle.tick(&fx.host), ToggleTick::Holding);
        }

        for hook in &fx.counters {
            assert_eq!(disables(hook), 1);
            assert_eq!(enables(hook), 0);
            assert!(!hook.is_enabled());
        }
        assert_eq!(fx.target.get(), 1.8);
    }

    #[test]
    fn deactivation_reenables_hooks_once_and_restores_neutral() {
        let mut fx = fixture(true);
        fx.toggle.value_mut().commit("2.5");
        fx.toggle.set_enabled(true);
        fx.toggle.tick(&fx.host);

        fx.toggle.set_enabled(false);
        assert_eq!(
            fx.toggle.tick(&fx.host),
            ToggleTick::Edge { active: false }
        );
        for _ in 0..10 {
            assert_eq!(fx.toggle.tick(&fx.host), ToggleTick::Idle);
        }

        assert_eq!(total(&fx.counters, disables), POWER_MULTIPLIER_HOOKS.len());
        assert_eq!(total(&fx.counters, enables), POWER_MULTIPLIER_HOOKS.len());
        assert!(fx.counters.iter().all(|hook| hook.is_enabled()));
        assert_eq!(fx.target.get(), 1.0);
    }

    #[test]
    fn inactive_toggle_never_writes_target() {
        let mut fx = fixture(true);
        fx.target.set(0.7);
        for _ in 0..5 {
            fx.toggle.tick(&fx.host);
        }
        assert_eq!(fx.target.get(), 0.7);
        assert_eq!(total(&fx.counters, disables), 0);
    }

    #[test]
    fn active_override_is_clamped_to_floor() {
        let mut fx = fixture(true);
        fx.toggle.value_mut().commit("0.05");
        fx.toggle.set_enabled(true);
        fx.toggle.tick(&fx.host);
        assert_eq!(fx.target.get(), 0.1);
        assert_eq!(fx.toggle.value().buffer(), "0.1");

        fx.toggle.value_mut().commit("0");
        fx.toggle.tick(&fx.host);
        assert_eq!(fx.target.get(), 0.1);

        fx.toggle.value_mut().commit("-3");
        fx.toggle.tick(&fx.host);
        assert_eq!(fx.target.get(), 0.1);
    }

    #[test]
    fn continuous_write_overrides_host_changes() {
        let mut fx = fixture(true);
        fx.toggle.value_mut().commit("1.4");
        fx.toggle.set_enabled(true);
        fx.toggle.tick(&fx.host);

        fx.target.set(0.3);
        assert_eq!(fx.toggle.tick(&fx.host), ToggleTick::Holding);
        assert_eq!(fx.target.get(), 1.4);
    }

    #[test]
    fn unready_host_skips_and_defers_the_edge() {
        let mut fx = fixture(false);
        fx.toggle.set_enabled(true);
        for _ in 0..20 {
            assert_eq!(fx.toggle.tick(&fx.host), ToggleTick::Skipped);
        }
        assert!(!fx.toggle.hooks_resolved());
        assert_eq!(total(&fx.counters, disables), 0);

        for subsystem in POWER_MULTIPLIER_SUBSYSTEMS {
            fx.host.set_ready(*subsystem, true);
        }
        assert_eq!(
            fx.toggle.tick(&fx.host),
            ToggleTick::Edge { active: true }
        );
        assert_eq!(total(&fx.counters, disables), POWER_MULTIPLIER_HOOKS.len());
    }

    #[test]
    fn subsystem_going_inactive_pauses_ticks() {
        let mut fx = fixture(true);
        fx.toggle.tick(&fx.host);
        fx.host.set_ready("engine/n2o", false);

        fx.toggle.set_enabled(true);
        assert_eq!(fx.toggle.tick(&fx.host), ToggleTick::Skipped);
        assert!(!fx.toggle.last_applied());

        fx.host.set_ready("engine/n2o", true);
        assert_eq!(
            fx.toggle.tick(&fx.host),
            ToggleTick::Edge { active: true }
        );
    }

    #[test]
    fn missing_hook_skips_until_it_appears() {
        let mut fx = fixture(true);
        let missing = POWER_MULTIPLIER_HOOKS[2];
        fx.host.remove(missing);
        fx.toggle.set_enabled(true);

        assert_eq!(fx.toggle.tick(&fx.host), ToggleTick::Skipped);
        assert_eq!(fx.toggle.tick(&fx.host), ToggleTick::Skipped);
        assert_eq!(total(&fx.counters, disables), 0);

        fx.host.insert_hook(missing);
        assert_eq!(
            fx.toggle.tick(&fx.host),
            ToggleTick::Edge { active: true }
        );
    }

    #[test]
    fn missing_target_degrades_to_no_op() {
        let host = InMemoryHost::vehicle_demo();
        let mut toggle = OverrideToggle::new(
            "power_multiplier_override_enabled",
            "Override Power Multiplier",
            &SPEC,
            None,
            &OverrideConfig::default(),
            &ReadinessConfig::default(),
        );
        toggle.set_enabled(true);
        assert_eq!(toggle.tick(&host), ToggleTick::Skipped);
        assert!(!toggle.last_applied());
    }

    #[test]
    fn deactivate_processes_edge_immediately() {
        let mut fx = fixture(true);
        fx.toggle.set_enabled(true);
        fx.toggle.tick(&fx.host);

        assert_eq!(
            fx.toggle.deactivate(&fx.host),
            ToggleTick::Edge { active: false }
        );
        assert!(!fx.toggle.last_applied());
        assert_eq!(fx.toggle.deactivate(&fx.host), ToggleTick::Idle);
        assert_eq!(total(&fx.counters, enables), POWER_MULTIPLIER_HOOKS.len());
    }
}
