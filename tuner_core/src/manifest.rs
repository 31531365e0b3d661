//! Declarative, ordered list of everything the tuner binds.
//!
//! The manifest order is the order of the registry, of the view model and of
//! the keys in a persisted profile.

#[derive(Debug, Clone, PartialEq)]
pub struct OverrideSpec {
    /// Snapshot key of the override amount (the binding key holds the flag).
    pub value_key: &'static str,
    pub value_label: &'static str,
    pub default_value: f32,
    /// Host behaviours disabled while the override is active.
    pub hooks: &'static [&'static str],
    /// Subsystems that must be active before hooks resolve and ticks run.
    pub ready: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxleSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub left: &'static str,
    pub right: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetSpec {
    pub axles: &'static [AxleSpec],
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingKind {
    Number,
    Flag,
    Transmission,
    Sequence,
    Override(OverrideSpec),
    Offset(OffsetSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingSpec {
    pub key: &'static str,
    pub label: &'static str,
    /// Host path of the live target; unused for offset groups.
    pub path: &'static str,
    pub kind: BindingKind,
}

impl BindingSpec {
    /// Every profile key this binding owns, its own key first.
    pub fn snapshot_keys(&self) -> Vec<&'static str> {
        let mut keys = vec![self.key];
        match &self.kind {
            BindingKind::Override(spec) => keys.push(spec.value_key),
            BindingKind::Offset(spec) => keys.extend(spec.axles.iter().map(|axle| axle.key)),
            _ => {}
        }
        keys
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TuningManifest {
    bindings: Vec<BindingSpec>,
}

impl TuningManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bindings(&self) -> &[BindingSpec] {
        &self.bindings
    }

    pub fn push(
        mut self,
        key: &'static str,
        label: &'static str,
        path: &'static str,
        kind: BindingKind,
    ) -> Self {
        let spec = BindingSpec {
            key,
            label,
            path,
            kind,
        };
        if cfg!(debug_assertions) {
            for new_key in spec.snapshot_keys() {
                assert!(
                    !self
                        .bindings
                        .iter()
                        .any(|existing| existing.snapshot_keys().contains(&new_key)),
                    "duplicate manifest key {new_key}"
                );
            }
        }
        self.bindings.push(spec);
        self
    }

    pub fn number(self, key: &'static str, label: &'static str, path: &'static str) -> Self {
        self.push(key, label, path, BindingKind::Number)
    }

    pub fn flag(self, key: &'static str, label: &'static str, path: &'static str) -> Self {
        self.push(key, label, path, BindingKind::Flag)
    }

    pub fn transmission(self, key: &'static str, label: &'static str, path: &'static str) -> Self {
        self.push(key, label, path, BindingKind::Transmission)
    }

    pub fn sequence(self, key: &'static str, label: &'static str, path: &'static str) -> Self {
        self.push(key, label, path, BindingKind::Sequence)
    }

    pub fn override_toggle(
        self,
        key: &'static str,
        label: &'static str,
        path: &'static str,
        spec: OverrideSpec,
    ) -> Self {
        self.push(key, label, path, BindingKind::Override(spec))
    }

    pub fn offsets(self, key: &'static str, label: &'static str, spec: OffsetSpec) -> Self {
        self.push(key, label, "", BindingKind::Offset(spec))
    }
}

pub const POWER_MULTIPLIER_HOOKS: &[&str] = &[
    "engine/n2o/boost/power_clamp",
    "engine/n2o/boost/set_multiplier",
    "engine/n2o/wait_player/set_multiplier",
    "engine/rev_limiter/normal_revs/set_multiplier",
    "engine/rev_limiter/valve_float/clamp",
    "engine/rev_limiter/valve_float/operator",
];

pub const POWER_MULTIPLIER_SUBSYSTEMS: &[&str] = &["engine/n2o", "engine/rev_limiter"];

pub const WHEEL_AXLES: &[AxleSpec] = &[
    AxleSpec {
        key: "front_wheels_offset_x",
        label: "Front Wheels Offset X",
        left: "wheels/fl/x",
        right: "wheels/fr/x",
    },
    AxleSpec {
        key: "rear_wheels_offset_x",
        label: "Rear Wheels Offset X",
        left: "wheels/rl/x",
        right: "wheels/rr/x",
    },
];

/// The full parameter set of the tuned vehicle.
pub fn vehicle_manifest() -> TuningManifest {
    TuningManifest::new()
        // suspension height
        .number("wheel_pos_long", "Wheel Pos Long", "suspension/wheel_pos_long")
        .number("wheel_pos_rally", "Wheel Pos Rally", "suspension/wheel_pos_rally")
        .number("wheel_pos_stock", "Wheel Pos Stock", "suspension/wheel_pos_stock")
        .override_toggle(
            "power_multiplier_override_enabled",
            "Override Power Multiplier",
            "drivetrain/power_multiplier",
            OverrideSpec {
                value_key: "power_multiplier_override",
                value_label: "Power Multiplier",
                default_value: 1.0,
                hooks: POWER_MULTIPLIER_HOOKS,
                ready: POWER_MULTIPLIER_SUBSYSTEMS,
            },
        )
        .flag("automatic", "Automatic", "drivetrain/automatic")
        .flag("auto_reverse", "Auto Reverse", "drivetrain/auto_reverse")
        .transmission("transmission", "Type of Drive", "drivetrain/transmission")
        .flag("tcs", "TCS", "assist/tcs")
        .number("tcs_allowed_slip", "TCS Allowed Slip", "assist/tcs_allowed_slip")
        .number("tcs_min_velocity", "TCS Min Velocity", "assist/tcs_min_velocity")
        .flag("abs", "ABS", "assist/abs")
        .number("abs_allowed_slip", "ABS Allowed Slip", "assist/abs_allowed_slip")
        .number("abs_min_velocity", "ABS Min Velocity", "assist/abs_min_velocity")
        .flag("esp", "ESP", "assist/esp")
        .number("esp_strength", "ESP Strength", "assist/esp_strength")
        .number("esp_min_velocity", "ESP Min Velocity", "assist/esp_min_velocity")
        .number("front_camber", "Front Camber", "suspension/front_camber")
        .number("rear_camber", "Rear Camber", "suspension/rear_camber")
        .offsets(
            "custom_wheels_offset_enabled",
            "Use Custom Wheel Offsets",
            OffsetSpec { axles: WHEEL_AXLES },
        )
        .number("travel_long", "Travel Long", "suspension/travel_long")
        .number("travel_rally", "Travel Rally", "suspension/travel_rally")
        .number("travel_stock", "Travel Stock", "suspension/travel_stock")
        .number("rally_front_rate", "Rally Front Rate", "suspension/rally_front_rate")
        .number("stock_front_rate", "Stock Front Rate", "suspension/stock_front_rate")
        .number("long_rear_rate", "Long Rear Rate", "suspension/long_rear_rate")
        .number("rally_rear_rate", "Rally Rear Rate", "suspension/rally_rear_rate")
        .number("stock_rear_rate", "Stock Rear Rate", "suspension/stock_rear_rate")
        .number("rally_front_l_bump", "Rally Front L Bump", "suspension/rally_front_l_bump")
        .number("rally_front_l_rebound", "Rally Front L Rebound", "suspension/rally_front_l_rebound")
        .number("rally_front_r_bump", "Rally Front R Bump", "suspension/rally_front_r_bump")
        .number("rally_front_r_rebound", "Rally Front R Rebound", "suspension/rally_front_r_rebound")
        .number("rally_rear_l_bump", "Rally Rear L Bump", "suspension/rally_rear_l_bump")
        .number("rally_rear_l_rebound", "Rally Rear L Rebound", "suspension/rally_rear_l_rebound")
        .number("rally_rear_r_bump", "Rally Rear R Bump", "suspension/rally_rear_r_bump")
        .number("rally_rear_r_rebound", "Rally Rear R Rebound", "suspension/rally_rear_r_rebound")
        .number("stock_front_bump", "Stock Front Bump", "suspension/stock_front_bump")
        .number("stock_front_rebound", "Stock Front Rebound", "suspension/stock_front_rebound")
        .number("stock_rear_bump", "Stock Rear Bump", "suspension/stock_rear_bump")
        .number("stock_rear_rebound", "Stock Rear Rebound", "suspension/stock_rear_rebound")
        .number("center_of_gravity", "Center of Gravity", "body/center_of_gravity")
        .sequence("gear_ratios", "Gear Ratios", "drivetrain/gear_ratios")
}
