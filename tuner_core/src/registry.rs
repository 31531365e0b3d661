use tracing::{debug, warn};

use crate::live::LiveTargetResolver;
use crate::manifest::{BindingKind, BindingSpec, TuningManifest};
use crate::numeric_field::NumericField;
use crate::offset_toggle::OffsetToggle;
use crate::override_toggle::OverrideToggle;
use crate::sequence_field::SequenceField;
use crate::tuner_config::TunerConfig;
use crate::value_field::{FlagField, TransmissionField};

/// A resolved manifest entry.
pub enum Binding {
    Number(NumericField),
    Flag(FlagField),
    Transmission(TransmissionField),
    Sequence(SequenceField),
    Override(OverrideToggle),
    Offset(OffsetToggle),
}

impl Binding {
    pub fn key(&self) -> &str {
        match self {
            Binding::Number(field) => field.key(),
            Binding::Flag(field) => field.key(),
            Binding::Transmission(field) => field.key(),
            Binding::Sequence(field) => field.key(),
            Binding::Override(toggle) => toggle.key(),
            Binding::Offset(toggle) => toggle.key(),
        }
    }
}

/// Every field, sequence and toggle of one session, in manifest order.
#[derive(Default)]
pub struct FieldRegistry {
    bindings: Vec<Binding>,
}

impl FieldRegistry {
    /// Resolves each manifest entry against the host. Plain bindings whose
    /// target cannot be found are left out; toggles are always kept because
    /// their state belongs to the engine.
    pub fn bind(
        manifest: &TuningManifest,
        host: &dyn LiveTargetResolver,
        config: &TunerConfig,
    ) -> Self {
        let mut bindings = Vec::with_capacity(manifest.bindings().len());
        for spec in manifest.bindings() {
            if let Some(binding) = bind_one(spec, host, config) {
                bindings.push(binding);
            }
        }
        debug!(
            target: "tuner::registry",
            declared = manifest.bindings().len(),
            bound = bindings.len(),
            "registry.bound"
        );
        Self { bindings }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut [Binding] {
        &mut self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.bindings.iter().any(|binding| binding.key() == key)
    }

    /// Finds a numeric field by key, including override amounts and axle
    /// offsets.
    pub fn number(&self, key: &str) -> Option<&NumericField> {
        self.bindings.iter().find_map(|binding| match binding {
            Binding::Number(field) if field.key() == key => Some(field),
            Binding::Override(toggle) if toggle.value().key() == key => Some(toggle.value()),
            Binding::Offset(toggle) => toggle
                .axles()
                .iter()
                .map(|axle| axle.offset())
                .find(|offset| offset.key() == key),
            _ => None,
        })
    }

    pub fn number_mut(&mut self, key: &str) -> Option<&mut NumericField> {
        self.bindings.iter_mut().find_map(|binding| match binding {
            Binding::Number(field) if field.key() == key => Some(field),
            Binding::Override(toggle) if toggle.value().key() == key => Some(toggle.value_mut()),
            Binding::Offset(toggle) => toggle
                .axles_mut()
                .iter_mut()
                .map(|axle| axle.offset_mut())
                .find(|offset| offset.key() == key),
            _ => None,
        })
    }

    pub fn flag_mut(&mut self, key: &str) -> Option<&mut FlagField> {
        self.bindings.iter_mut().find_map(|binding| match binding {
            Binding::Flag(field) if field.key() == key => Some(field),
            _ => None,
        })
    }

    pub fn transmission_mut(&mut self, key: &str) -> Option<&mut TransmissionField> {
        self.bindings.iter_mut().find_map(|binding| match binding {
            Binding::Transmission(field) if field.key() == key => Some(field),
            _ => None,
        })
    }

    pub fn sequence(&self, key: &str) -> Option<&SequenceField> {
        self.bindings.iter().find_map(|binding| match binding {
            Binding::Sequence(field) if field.key() == key => Some(field),
            _ => None,
        })
    }

    pub fn sequence_mut(&mut self, key: &str) -> Option<&mut SequenceField> {
        self.bindings.iter_mut().find_map(|binding| match binding {
            Binding::Sequence(field) if field.key() == key => Some(field),
            _ => None,
        })
    }

    pub fn override_toggle(&self, key: &str) -> Option<&OverrideToggle> {
        self.bindings.iter().find_map(|binding| match binding {
            Binding::Override(toggle) if toggle.key() == key => Some(toggle),
            _ => None,
        })
    }

    pub fn override_mut(&mut self, key: &str) -> Option<&mut OverrideToggle> {
        self.bindings.iter_mut().find_map(|binding| match binding {
            Binding::Override(toggle) if toggle.key() == key => Some(toggle),
            _ => None,
        })
    }

    pub fn offsets_mut(&mut self, key: &str) -> Option<&mut OffsetToggle> {
        self.bindings.iter_mut().find_map(|binding| match binding {
            Binding::Offset(toggle) if toggle.key() == key => Some(toggle),
            _ => None,
        })
    }

    pub fn override_toggles_mut(&mut self) -> impl Iterator<Item = &mut OverrideToggle> {
        self.bindings.iter_mut().filter_map(|binding| match binding {
            Binding::Override(toggle) => Some(toggle),
            _ => None,
        })
    }

    pub fn offset_toggles_mut(&mut self) -> impl Iterator<Item = &mut OffsetToggle> {
        self.bindings.iter_mut().filter_map(|binding| match binding {
            Binding::Offset(toggle) => Some(toggle),
            _ => None,
        })
    }
}

fn bind_one(
    spec: &BindingSpec,
    host: &dyn LiveTargetResolver,
    config: &TunerConfig,
) -> Option<Binding> {
    let binding = match &spec.kind {
        BindingKind::Number => host
            .float(spec.path)
            .map(|target| Binding::Number(NumericField::bind(spec.key, spec.label, target))),
        BindingKind::Flag => host
            .flag(spec.path)
            .map(|target| Binding::Flag(FlagField::bind(spec.key, spec.label, target))),
        BindingKind::Transmission => host.transmission(spec.path).map(|target| {
            Binding::Transmission(TransmissionField::bind(spec.key, spec.label, target))
        }),
        BindingKind::Sequence => host
            .array(spec.path)
            .map(|target| Binding::Sequence(SequenceField::bind(spec.key, spec.label, target))),
        BindingKind::Override(over) => {
            let target = host.float(spec.path);
            if target.is_none() {
                warn!(
                    target: "tuner::registry",
                    key = spec.key,
                    path = spec.path,
                    "override.target_missing"
                );
            }
            Some(Binding::Override(OverrideToggle::new(
                spec.key,
                spec.label,
                over,
                target,
                config.override_config(),
                config.readiness(),
            )))
        }
        BindingKind::Offset(offsets) => Some(Binding::Offset(OffsetToggle::bind(
            spec.key, spec.label, offsets, host,
        ))),
    };

    if binding.is_none() {
        warn!(
            target: "tuner::registry",
            key = spec.key,
            path = spec.path,
            "binding.target_missing"
        );
    }
    binding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;
    use crate::manifest::vehicle_manifest;

    fn registry(host: &InMemoryHost) -> FieldRegistry {
        FieldRegistry::bind(&vehicle_manifest(), host, &TunerConfig::default())
    }

    #[test]
    fn binds_every_entry_of_the_demo_vehicle_in_order() {
        let host = InMemoryHost::vehicle_demo();
        let registry = registry(&host);
        let manifest = vehicle_manifest();
        let keys: Vec<_> = registry.bindings().iter().map(Binding::key).collect();
        let expected: Vec<_> = manifest.bindings().iter().map(|spec| spec.key).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn missing_plain_targets_are_omitted() {
        let host = InMemoryHost::vehicle_demo();
        host.remove("assist/esp_strength");
        host.remove("drivetrain/gear_ratios");
        let registry = registry(&host);
        assert!(!registry.contains("esp_strength"));
        assert!(registry.sequence("gear_ratios").is_none());
        assert!(registry.contains("esp_min_velocity"));
    }

    #[test]
    fn toggles_survive_missing_targets() {
        let host = InMemoryHost::vehicle_demo();
        host.remove("drivetrain/power_multiplier");
        let registry = registry(&host);
        let toggle = registry
            .override_toggle("power_multiplier_override_enabled")
            .expect("override toggle kept");
        assert!(toggle.target().is_none());
    }

    #[test]
    fn number_lookup_reaches_nested_fields() {
        let host = InMemoryHost::vehicle_demo();
        let mut registry = registry(&host);
        assert_eq!(
            registry.number("power_multiplier_override").map(|f| f.value()),
            Some(1.0)
        );
        let offset = registry
            .number_mut("rear_wheels_offset_x")
            .expect("axle offset reachable");
        offset.commit("0.02");
        assert_eq!(
            registry.number("rear_wheels_offset_x").map(|f| f.value()),
            Some(0.02)
        );
        assert!(registry.number("custom_wheels_offset_enabled").is_none());
        assert!(registry.number("tcs").is_none());
    }
}
