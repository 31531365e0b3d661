//! Custom per-axle wheel offsets.
//!
//! While enabled, each resolved axle pushes its wheels apart symmetrically
//! from their captured origins every tick. Disabling returns the wheels to
//! their origins and zeroes the offsets.

use tracing::{info, warn};

use crate::live::{Live, LiveTargetResolver};
use crate::manifest::{AxleSpec, OffsetSpec};
use crate::numeric_field::NumericField;

#[derive(Debug, Clone)]
struct Wheel {
    target: Live<f32>,
    origin: f32,
}

impl Wheel {
    fn bind(target: Live<f32>) -> Self {
        let origin = target.get();
        Self { target, origin }
    }
}

#[derive(Debug, Clone)]
pub struct AxleOffset {
    offset: NumericField,
    wheels: Option<(Wheel, Wheel)>,
}

impl AxleOffset {
    fn bind(spec: &AxleSpec, host: &dyn LiveTargetResolver) -> Self {
        let wheels = match (host.float(spec.left), host.float(spec.right)) {
            (Some(left), Some(right)) => Some((Wheel::bind(left), Wheel::bind(right))),
            _ => {
                warn!(
                    target: "tuner::registry",
                    axle = spec.key,
                    left = spec.left,
                    right = spec.right,
                    "offset.wheels_missing"
                );
                None
            }
        };
        Self {
            offset: NumericField::detached(spec.key, spec.label, 0.0),
            wheels,
        }
    }

    pub fn offset(&self) -> &NumericField {
        &self.offset
    }

    pub fn offset_mut(&mut self) -> &mut NumericField {
        &mut self.offset
    }

    pub fn is_resolved(&self) -> bool {
        self.wheels.is_some()
    }

    fn apply(&self) {
        if let Some((left, right)) = &self.wheels {
            let offset = self.offset.value();
            left.target.set(left.origin - offset);
            right.target.set(right.origin + offset);
        }
    }

    /// Zeroes the offset; wheels are only written back when `restore_wheels`.
    fn reset(&mut self, restore_wheels: bool) {
        if restore_wheels {
            if let Some((left, right)) = &self.wheels {
                left.target.set(left.origin);
                right.target.set(right.origin);
            }
        }
        self.offset.restore();
    }
}

#[derive(Debug, Clone)]
pub struct OffsetToggle {
    key: String,
    label: String,
    enabled: bool,
    last_applied: bool,
    axles: Vec<AxleOffset>,
}

impl OffsetToggle {
    pub fn bind(
        key: impl Into<String>,
        label: impl Into<String>,
        spec: &OffsetSpec,
        host: &dyn LiveTargetResolver,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            enabled: false,
            last_applied: false,
            axles: spec
                .axles
                .iter()
                .map(|axle| AxleOffset::bind(axle, host))
                .collect(),
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

    pub fn axles(&self) -> &[AxleOffset] {
        &self.axles
    }

    pub fn axles_mut(&mut self) -> &mut [AxleOffset] {
        &mut self.axles
    }

    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }

    pub fn tick(&mut self) {
        if self.enabled != self.last_applied {
            if !self.enabled {
                for axle in &mut self.axles {
                    axle.reset(true);
                }
            }
            self.last_applied = self.enabled;
            info!(
                target: "tuner::override",
                key = %self.key,
                active = self.enabled,
                "offsets.edge_applied"
            );
        }

        if self.enabled {
            for axle in &self.axles {
                axle.apply();
            }
        }
    }

    /// Disables the offsets and zeroes every offset. Wheels are put back only
    /// if the group was in use; otherwise the host still owns them.
    pub fn clear(&mut self) {
        let in_use = self.enabled || self.last_applied;
        self.enabled = false;
        self.last_applied = false;
        for axle in &mut self.axles {
            axle.reset(in_use);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;
    use crate::manifest::WHEEL_AXLES;

    fn wheels() -> (InMemoryHost, [Live<f32>; 4]) {
        let host = InMemoryHost::new();
        let lives = [
            host.insert_float("wheels/fl/x", -0.68),
            host.insert_float("wheels/fr/x", 0.68),
            host.insert_float("wheels/rl/x", -0.67),
            host.insert_float("wheels/rr/x", 0.67),
        ];
        (host, lives)
    }

    fn toggle(host: &InMemoryHost) -> OffsetToggle {
        OffsetToggle::bind(
            "custom_wheels_offset_enabled",
            "Use Custom Wheel Offsets",
            &OffsetSpec { axles: WHEEL_AXLES },
            host,
        )
    }

    #[test]
    fn enabled_offsets_push_wheels_apart_every_tick() {
        let (host, [fl, fr, rl, rr]) = wheels();
        let mut offsets = toggle(&host);
        offsets.axles_mut()[0].offset_mut().commit("0.5");
        offsets.axles_mut()[1].offset_mut().commit("0.25");

        offsets.tick();
        assert_eq!(fl.get(), -0.68);

        offsets.set_enabled(true);
        offsets.tick();
        assert_eq!(fl.get(), -0.68 - 0.5);
        assert_eq!(fr.get(), 0.68 + 0.5);
        assert_eq!(rl.get(), -0.67 - 0.25);
        assert_eq!(rr.get(), 0.67 + 0.25);

        fl.set(0.0);
        offsets.tick();
        assert_eq!(fl.get(), -0.68 - 0.5);
    }

    #[test]
    fn disabling_restores_origins_and_zeroes_offsets() {
        let (host, [fl, fr, _, _]) = wheels();
        let mut offsets = toggle(&host);
        offsets.axles_mut()[0].offset_mut().commit("0.5");
        offsets.set_enabled(true);
        offsets.tick();

        offsets.set_enabled(false);
        offsets.tick();
        assert_eq!(fl.get(), -0.68);
        assert_eq!(fr.get(), 0.68);
        assert_eq!(offsets.axles()[0].offset().value(), 0.0);
        assert_eq!(offsets.axles()[0].offset().buffer(), "0");
    }

    #[test]
    fn axle_with_missing_wheel_is_inert() {
        let (host, [fl, _, rl, _]) = wheels();
        host.remove("wheels/fr/x");
        let mut offsets = toggle(&host);
        assert!(!offsets.axles()[0].is_resolved());
        assert!(offsets.axles()[1].is_resolved());

        offsets.axles_mut()[0].offset_mut().commit("0.5");
        offsets.axles_mut()[1].offset_mut().commit("0.5");
        offsets.set_enabled(true);
        offsets.tick();
        assert_eq!(fl.get(), -0.68);
        assert_eq!(rl.get(), -0.67 - 0.5);
    }

    #[test]
    fn clear_leaves_host_wheels_alone_when_unused() {
        let (host, [fl, ..]) = wheels();
        let mut offsets = toggle(&host);
        offsets.axles_mut()[0].offset_mut().commit("0.3");
        fl.set(-0.75);

        offsets.clear();
        assert_eq!(fl.get(), -0.75);
        assert_eq!(offsets.axles()[0].offset().value(), 0.0);
    }

    #[test]
    fn clear_is_idempotent() {
        let (host, [fl, ..]) = wheels();
        let mut offsets = toggle(&host);
        offsets.axles_mut()[0].offset_mut().commit("0.3");
        offsets.set_enabled(true);
        offsets.tick();

        offsets.clear();
        assert!(!offsets.is_enabled());
        assert_eq!(fl.get(), -0.68);
        offsets.clear();
        offsets.tick();
        assert_eq!(fl.get(), -0.68);
        assert_eq!(offsets.axles()[0].offset().value(), 0.0);
    }
}
