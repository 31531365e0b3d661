use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::live::{HookSwitch, Live, LiveTargetResolver};
use crate::manifest::{POWER_MULTIPLIER_HOOKS, POWER_MULTIPLIER_SUBSYSTEMS};
use crate::value_field::Transmission;

#[derive(Default)]
struct HostTables {
    floats: HashMap<String, Live<f32>>,
    flags: HashMap<String, Live<bool>>,
    arrays: HashMap<String, Live<Vec<f32>>>,
    transmissions: HashMap<String, Live<Transmission>>,
    hooks: HashMap<String, Arc<dyn HookSwitch>>,
    ready: HashSet<String>,
}

/// Cheaply cloneable; clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryHost {
    tables: Arc<RwLock<HostTables>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_float(&self, path: impl Into<String>, value: f32) -> Live<f32> {
        let live = Live::new(value);
        self.tables.write().floats.insert(path.into(), live.clone());
        live
    }

    pub fn insert_flag(&self, path: impl Into<String>, value: bool) -> Live<bool> {
        let live = Live::new(value);
        self.tables.write().flags.insert(path.into(), live.clone());
        live
    }

    pub fn insert_array(&self, path: impl Into<String>, values: Vec<f32>) -> Live<Vec<f32>> {
        let live = Live::new(values);
        self.tables.write().arrays.insert(path.into(), live.clone());
        live
    }

    pub fn insert_transmission(
        &self,
        path: impl Into<String>,
        value: Transmission,
    ) -> Live<Transmission> {
        let live = Live::new(value);
        self.tables
            .write()
            .transmissions
            .insert(path.into(), live.clone());
        live
    }

    /// Registers an enabled hook backed by a plain flag.
    pub fn insert_hook(&self, path: impl Into<String>) -> Live<bool> {
        let live = Live::new(true);
        self.insert_hook_switch(path, Arc::new(live.clone()));
        live
    }

    pub fn insert_hook_switch(&self, path: impl Into<String>, hook: Arc<dyn HookSwitch>) {
        self.tables.write().hooks.insert(path.into(), hook);
    }

    pub fn remove(&self, path: &str) {
        let mut tables = self.tables.write();
        tables.floats.remove(path);
        tables.flags.remove(path);
        tables.arrays.remove(path);
        tables.transmissions.remove(path);
        tables.hooks.remove(path);
    }

    pub fn set_ready(&self, subsystem: impl Into<String>, ready: bool) {
        let subsystem = subsystem.into();
        let mut tables = self.tables.write();
        if ready {
            tables.ready.insert(subsystem);
        } else {
            tables.ready.remove(&subsystem);
        }
    }

    /// A fully populated vehicle matching [`crate::manifest::vehicle_manifest`],
    /// with every subsystem already active.
    pub fn vehicle_demo() -> Self {
        let host = Self::new();

        for (path, value) in [
            ("suspension/wheel_pos_long", -0.16),
            ("suspension/wheel_pos_rally", -0.2),
            ("suspension/wheel_pos_stock", -0.18),
            ("suspension/front_camber", 0.0),
            ("suspension/rear_camber", 0.0),
            ("suspension/travel_long", 0.12),
            ("suspension/travel_rally", 0.15),
            ("suspension/travel_stock", 0.1),
            ("suspension/rally_front_rate", 32_000.0),
            ("suspension/stock_front_rate", 24_000.0),
            ("suspension/long_rear_rate", 20_000.0),
            ("suspension/rally_rear_rate", 28_000.0),
            ("suspension/stock_rear_rate", 22_000.0),
            ("suspension/rally_front_l_bump", 1_800.0),
            ("suspension/rally_front_l_rebound", 2_400.0),
            ("suspension/rally_front_r_bump", 1_800.0),
            ("suspension/rally_front_r_rebound", 2_400.0),
            ("suspension/rally_rear_l_bump", 1_600.0),
            ("suspension/rally_rear_l_rebound", 2_200.0),
            ("suspension/rally_rear_r_bump", 1_600.0),
            ("suspension/rally_rear_r_rebound", 2_200.0),
            ("suspension/stock_front_bump", 1_400.0),
            ("suspension/stock_front_rebound", 2_000.0),
            ("suspension/stock_rear_bump", 1_200.0),
            ("suspension/stock_rear_rebound", 1_800.0),
            ("body/center_of_gravity", 0.05),
            ("drivetrain/power_multiplier", 1.0),
            ("assist/tcs_allowed_slip", 0.1),
            ("assist/tcs_min_velocity", 1.5),
            ("assist/abs_allowed_slip", 0.2),
            ("assist/abs_min_velocity", 3.0),
            ("assist/esp_strength", 2.0),
            ("assist/esp_min_velocity", 4.0),
            ("wheels/fl/x", -0.68),
            ("wheels/fr/x", 0.68),
            ("wheels/rl/x", -0.67),
            ("wheels/rr/x", 0.67),
        ] {
            host.insert_float(path, value);
        }

        for path in [
            "drivetrain/automatic",
            "drivetrain/auto_reverse",
            "assist/tcs",
            "assist/abs",
            "assist/esp",
        ] {
            host.insert_flag(path, false);
        }

        host.insert_transmission("drivetrain/transmission", Transmission::Fwd);
        host.insert_array(
            "drivetrain/gear_ratios",
            vec![-4.093, 0.0, 3.673, 2.217, 1.448, 1.0],
        );

        for path in POWER_MULTIPLIER_HOOKS {
            host.insert_hook(*path);
        }
        for subsystem in POWER_MULTIPLIER_SUBSYSTEMS {
            host.set_ready(*subsystem, true);
        }

        host
    }
}

impl LiveTargetResolver for InMemoryHost {
    fn float(&self, path: &str) -> Option<Live<f32>> {
        self.tables.read().floats.get(path).cloned()
    }

    fn flag(&self, path: &str) -> Option<Live<bool>> {
        self.tables.read().flags.get(path).cloned()
    }

    fn array(&self, path: &str) -> Option<Live<Vec<f32>>> {
        self.tables.read().arrays.get(path).cloned()
    }

    fn transmission(&self, path: &str) -> Option<Live<Transmission>> {
        self.tables.read().transmissions.get(path).cloned()
    }

    fn hook(&self, path: &str) -> Option<Arc<dyn HookSwitch>> {
        self.tables.read().hooks.get(path).cloned()
    }

    fn is_ready(&self, subsystem: &str) -> bool {
        self.tables.read().ready.contains(subsystem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{vehicle_manifest, BindingKind};

    #[test]
    fn lookups_return_shared_cells() {
        let host = InMemoryHost::new();
        let live = host.insert_float("body/center_of_gravity", 0.05);
        let resolved = host.float("body/center_of_gravity").unwrap();
        resolved.set(0.1);
        assert_eq!(live.get(), 0.1);
        assert!(host.float("body/missing").is_none());
        assert!(host.flag("body/center_of_gravity").is_none());
    }

    #[test]
    fn removed_paths_stop_resolving() {
        let host = InMemoryHost::new();
        host.insert_hook("engine/n2o/boost/power_clamp");
        assert!(host.hook("engine/n2o/boost/power_clamp").is_some());
        host.remove("engine/n2o/boost/power_clamp");
        assert!(host.hook("engine/n2o/boost/power_clamp").is_none());
    }

    #[test]
    fn vehicle_demo_covers_the_vehicle_manifest() {
        let host = InMemoryHost::vehicle_demo();
        for spec in vehicle_manifest().bindings() {
            let resolved = match &spec.kind {
                BindingKind::Number => host.float(spec.path).is_some(),
                BindingKind::Flag => host.flag(spec.path).is_some(),
                BindingKind::Transmission => host.transmission(spec.path).is_some(),
                BindingKind::Sequence => host.array(spec.path).is_some(),
                BindingKind::Override(over) => {
                    host.float(spec.path).is_some()
                        && over.hooks.iter().all(|hook| host.hook(hook).is_some())
                        && over.ready.iter().all(|name| host.is_ready(name))
                }
                BindingKind::Offset(offsets) => offsets
                    .axles
                    .iter()
                    .all(|axle| host.float(axle.left).is_some() && host.float(axle.right).is_some()),
            };
            assert!(resolved, "{} should resolve on the demo vehicle", spec.key);
        }
    }
}
