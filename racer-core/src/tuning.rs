/* Vehicle tuning: every constant the dynamics model reads, grouped the same
 * way the model is split up. All of it is immutable once a vehicle spawns.
 *
 * Speeds are km/h, torques N·m, masses kg, angles degrees. Anything suffixed
 * `_per_tick` is tuned against REFERENCE_TICK_SECONDS. */

use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use glam::DVec3;
use log::info;
use serde::{Deserialize, Serialize};

use crate::curve::CurveTable;
use crate::error::TuningError;
use crate::KMH_PER_MS;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevLimitMode {
    None,
    Interval,
    AccelOff,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowertrainConfig {
    pub max_rpm: f64,
    pub rpm_rise_per_tick: f64,
    pub rpm_fall_per_tick: f64,

    pub rev_limit: RevLimitMode,
    pub red_zone_rpm: f64,
    pub limiter_interval_seconds: f64,
    pub accel_off_start_rpm: f64,

    pub torque_curve: CurveTable,
    pub resist_torque: f64,
    // resistive torque never exceeds |wheel speed| * this
    pub resist_speed_cap: f64,
    pub brake_torque: f64,

    pub final_gear_ratio: f64,
    pub cvt: CvtConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvtConfig {
    pub start_gear_ratio: f64,
    pub end_gear_ratio: f64,
    pub min_rpm: f64,
    pub max_rpm: f64,
    pub ratio_change_per_tick: f64,
    // below target * lower_band the ratio climbs at full speed
    pub lower_band_fraction: f64,
    // above target * upper_band the ratio starts dropping
    pub upper_band_fraction: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GripConfig {
    pub forward_curve: CurveTable,
    pub sideways_curve: CurveTable,

    pub tire_friction: f64,
    pub standard_ground_friction: f64,
    pub ice_ground_friction: f64,
    pub grip_power_rate_forward: f64,
    pub grip_power_rate_sideways: f64,

    // 0 = front wheels only, 1 = rear wheels only
    pub drive_distribution_forward: f64,
    // 0 = left wheels only, 1 = right wheels only
    pub drive_distribution_sideways: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub mass: f64,
    pub max_slip_ratio: f64,
    // body-local mounting points, indexed like WheelPosition
    pub offsets: [DVec3; 4],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspensionConfig {
    pub probe_length: f64,
    pub rest_length: f64,
    pub spring_constant: f64,
    // multiplies the world vertical velocity; negative damps
    pub damping_coefficient: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub mass: f64,
    // legs double as wheels, so this is also the drive lever length
    pub leg_length: f64,
    pub inertial_force_rate: f64,
    pub downforce: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub min_assist_speed: f64,
    pub max_assist_speed: f64,
    // yaw gain at or below min_assist_speed
    pub fast_steer_gain: f64,
    // yaw gain at or above max_assist_speed
    pub slow_steer_gain: f64,
    pub max_yaw_rate_per_tick: f64,
    pub yaw_rate_decay_per_tick: f64,
    pub air_pitch_rate: f64,
    pub max_air_pitch: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub powertrain: PowertrainConfig,
    pub grip: GripConfig,
    pub wheels: WheelConfig,
    pub suspension: SuspensionConfig,
    pub body: BodyConfig,
    pub steering: SteeringConfig,
}

fn curve(samples: [f64; 11]) -> CurveTable {
    CurveTable::builtin(samples)
}

impl Default for PowertrainConfig {
    fn default() -> Self {
        PowertrainConfig {
            max_rpm: 10000.0,
            rpm_rise_per_tick: 2000.0,
            rpm_fall_per_tick: 1000.0,
            rev_limit: RevLimitMode::AccelOff,
            red_zone_rpm: 9000.0,
            limiter_interval_seconds: 0.2,
            accel_off_start_rpm: 8000.0,
            torque_curve: curve([
                120.0, 150.0, 175.0, 190.0, 200.0, 200.0, 195.0, 185.0, 170.0, 150.0, 120.0,
            ]),
            resist_torque: 10.0,
            resist_speed_cap: 10.0,
            brake_torque: 10.0,
            final_gear_ratio: 4.0,
            cvt: CvtConfig::default(),
        }
    }
}

impl Default for CvtConfig {
    fn default() -> Self {
        CvtConfig {
            start_gear_ratio: 3.152,
            end_gear_ratio: 0.577,
            min_rpm: 4000.0,
            max_rpm: 6000.0,
            ratio_change_per_tick: 0.2,
            lower_band_fraction: 0.6,
            upper_band_fraction: 1.0,
        }
    }
}

impl Default for GripConfig {
    fn default() -> Self {
        GripConfig {
            forward_curve: curve([0.6, 0.85, 1.0, 0.95, 0.9, 0.85, 0.8, 0.75, 0.7, 0.65, 0.6]),
            sideways_curve: curve([1.0, 0.95, 0.9, 0.8, 0.7, 0.6, 0.5, 0.45, 0.4, 0.35, 0.3]),
            tire_friction: 1.0,
            standard_ground_friction: 1.0,
            ice_ground_friction: 0.2,
            grip_power_rate_forward: 1.0,
            grip_power_rate_sideways: 1.0,
            drive_distribution_forward: 0.5,
            drive_distribution_sideways: 0.5,
        }
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        WheelConfig {
            mass: 1.0,
            max_slip_ratio: 1.0,
            offsets: [
                DVec3::new(0.3, -0.7, 0.3),
                DVec3::new(-0.3, -0.7, 0.3),
                DVec3::new(0.3, -0.7, -0.3),
                DVec3::new(-0.3, -0.7, -0.3),
            ],
        }
    }
}

impl Default for SuspensionConfig {
    fn default() -> Self {
        SuspensionConfig {
            probe_length: 2.0,
            rest_length: 1.0,
            spring_constant: 1000.0,
            damping_coefficient: -100.0,
        }
    }
}

impl Default for BodyConfig {
    fn default() -> Self {
        BodyConfig {
            mass: 60.0,
            leg_length: 0.7,
            inertial_force_rate: 0.01,
            downforce: 500.0,
        }
    }
}

impl Default for SteeringConfig {
    fn default() -> Self {
        SteeringConfig {
            min_assist_speed: 5.0,
            max_assist_speed: 100.0,
            fast_steer_gain: 6.0,
            slow_steer_gain: 1.0,
            max_yaw_rate_per_tick: 6.0,
            yaw_rate_decay_per_tick: 1.0,
            air_pitch_rate: 60.0,
            max_air_pitch: 30.0,
        }
    }
}

impl PowertrainConfig {
    pub fn start_total_ratio(&self) -> f64 {
        self.cvt.start_gear_ratio * self.final_gear_ratio
    }

    pub fn end_total_ratio(&self) -> f64 {
        self.cvt.end_gear_ratio * self.final_gear_ratio
    }
}

impl BodyConfig {
    pub fn wheel_circumference(&self) -> f64 {
        PI * self.leg_length
    }
}

impl SteeringConfig {
    /// `(fast, slow)`: the yaw gain used at low speed and at high speed.
    pub fn rate_pair(&self) -> (f64, f64) {
        (self.fast_steer_gain, self.slow_steer_gain)
    }
}

impl VehicleConfig {
    pub fn from_yaml_str(source: &str) -> Result<VehicleConfig, TuningError> {
        let config: VehicleConfig = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<VehicleConfig, TuningError> {
        let path = path.as_ref();
        let config = VehicleConfig::from_yaml_str(&fs::read_to_string(path)?)?;
        info!("loaded vehicle tuning from {}", path.display());
        Ok(config)
    }

    /// Theoretical top speed in km/h: max RPM through the tallest CVT ratio.
    pub fn max_speed(&self) -> f64 {
        (self.body.wheel_circumference() * self.powertrain.max_rpm * 60.0)
            / (1000.0 * self.powertrain.end_total_ratio())
    }

    /// Theoretical peak acceleration: peak torque through the shortest CVT
    /// ratio over half a leg length.
    pub fn max_accel(&self) -> f64 {
        (self.powertrain.torque_curve.max_sample() * self.powertrain.start_total_ratio()
            / (self.body.leg_length / 2.0))
            / self.body.mass
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let p = &self.powertrain;
        let cvt = &p.cvt;
        let g = &self.grip;
        let s = &self.steering;

        let finite = [
            ("powertrain.max_rpm", p.max_rpm),
            ("powertrain.rpm_rise_per_tick", p.rpm_rise_per_tick),
            ("powertrain.rpm_fall_per_tick", p.rpm_fall_per_tick),
            ("powertrain.red_zone_rpm", p.red_zone_rpm),
            ("powertrain.limiter_interval_seconds", p.limiter_interval_seconds),
            ("powertrain.accel_off_start_rpm", p.accel_off_start_rpm),
            ("powertrain.resist_torque", p.resist_torque),
            ("powertrain.resist_speed_cap", p.resist_speed_cap),
            ("powertrain.brake_torque", p.brake_torque),
            ("powertrain.final_gear_ratio", p.final_gear_ratio),
            ("powertrain.cvt.start_gear_ratio", cvt.start_gear_ratio),
            ("powertrain.cvt.end_gear_ratio", cvt.end_gear_ratio),
            ("powertrain.cvt.min_rpm", cvt.min_rpm),
            ("powertrain.cvt.max_rpm", cvt.max_rpm),
            ("powertrain.cvt.ratio_change_per_tick", cvt.ratio_change_per_tick),
            ("powertrain.cvt.lower_band_fraction", cvt.lower_band_fraction),
            ("powertrain.cvt.upper_band_fraction", cvt.upper_band_fraction),
            ("grip.tire_friction", g.tire_friction),
            ("grip.standard_ground_friction", g.standard_ground_friction),
            ("grip.ice_ground_friction", g.ice_ground_friction),
            ("grip.grip_power_rate_forward", g.grip_power_rate_forward),
            ("grip.grip_power_rate_sideways", g.grip_power_rate_sideways),
            ("grip.drive_distribution_forward", g.drive_distribution_forward),
            ("grip.drive_distribution_sideways", g.drive_distribution_sideways),
            ("wheels.mass", self.wheels.mass),
            ("wheels.max_slip_ratio", self.wheels.max_slip_ratio),
            ("suspension.probe_length", self.suspension.probe_length),
            ("suspension.rest_length", self.suspension.rest_length),
            ("suspension.spring_constant", self.suspension.spring_constant),
            ("suspension.damping_coefficient", self.suspension.damping_coefficient),
            ("body.mass", self.body.mass),
            ("body.leg_length", self.body.leg_length),
            ("body.inertial_force_rate", self.body.inertial_force_rate),
            ("body.downforce", self.body.downforce),
            ("steering.min_assist_speed", s.min_assist_speed),
            ("steering.max_assist_speed", s.max_assist_speed),
            ("steering.fast_steer_gain", s.fast_steer_gain),
            ("steering.slow_steer_gain", s.slow_steer_gain),
            ("steering.max_yaw_rate_per_tick", s.max_yaw_rate_per_tick),
            ("steering.yaw_rate_decay_per_tick", s.yaw_rate_decay_per_tick),
            ("steering.air_pitch_rate", s.air_pitch_rate),
            ("steering.max_air_pitch", s.max_air_pitch),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(TuningError::invalid(field, "must be finite"));
            }
        }
        if self.wheels.offsets.iter().any(|offset| !offset.is_finite()) {
            return Err(TuningError::invalid("wheels.offsets", "must be finite"));
        }

        if p.max_rpm <= 0.0 {
            return Err(TuningError::invalid("powertrain.max_rpm", "must be positive"));
        }
        if p.rev_limit != RevLimitMode::None && p.red_zone_rpm > p.max_rpm {
            return Err(TuningError::invalid(
                "powertrain.red_zone_rpm",
                "must not exceed max_rpm",
            ));
        }
        if p.rev_limit == RevLimitMode::AccelOff && p.accel_off_start_rpm >= p.red_zone_rpm {
            return Err(TuningError::invalid(
                "powertrain.accel_off_start_rpm",
                "must be below red_zone_rpm",
            ));
        }
        if p.final_gear_ratio <= 0.0 {
            return Err(TuningError::invalid(
                "powertrain.final_gear_ratio",
                "must be positive",
            ));
        }
        if cvt.end_gear_ratio <= 0.0 || cvt.end_gear_ratio > cvt.start_gear_ratio {
            return Err(TuningError::invalid(
                "powertrain.cvt.end_gear_ratio",
                "must be positive and no larger than start_gear_ratio",
            ));
        }
        if cvt.min_rpm > cvt.max_rpm || cvt.max_rpm >= p.max_rpm {
            return Err(TuningError::invalid(
                "powertrain.cvt",
                "need min_rpm <= max_rpm < powertrain.max_rpm",
            ));
        }
        if !(cvt.lower_band_fraction > 0.0
            && cvt.lower_band_fraction < cvt.upper_band_fraction
            && cvt.upper_band_fraction <= 1.0)
        {
            return Err(TuningError::invalid(
                "powertrain.cvt",
                "need 0 < lower_band_fraction < upper_band_fraction <= 1",
            ));
        }
        if cvt.min_rpm <= 0.0 {
            return Err(TuningError::invalid("powertrain.cvt.min_rpm", "must be positive"));
        }
        for (field, fraction) in [
            ("grip.drive_distribution_forward", g.drive_distribution_forward),
            ("grip.drive_distribution_sideways", g.drive_distribution_sideways),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(TuningError::invalid(field, "must lie in [0, 1]"));
            }
        }
        if self.wheels.max_slip_ratio <= 0.0 {
            return Err(TuningError::invalid("wheels.max_slip_ratio", "must be positive"));
        }
        if self.wheels.mass <= 0.0 {
            return Err(TuningError::invalid("wheels.mass", "must be positive"));
        }
        if self.body.mass <= 0.0 {
            return Err(TuningError::invalid("body.mass", "must be positive"));
        }
        if self.body.leg_length <= 0.0 {
            return Err(TuningError::invalid("body.leg_length", "must be positive"));
        }
        // The grip clamp allows each wheel to push the body by up to
        // (wheel mass / body mass) of the km/h differential, in m/s. Four of
        // those must stay below the differential itself or the body overshoots
        // the wheels in a single tick.
        if 4.0 * self.wheels.mass * KMH_PER_MS >= self.body.mass {
            return Err(TuningError::invalid(
                "wheels.mass",
                "4 * wheel mass * 3.6 must stay below body mass",
            ));
        }
        if self.suspension.probe_length <= 0.0 {
            return Err(TuningError::invalid(
                "suspension.probe_length",
                "must be positive",
            ));
        }
        if s.min_assist_speed >= s.max_assist_speed {
            return Err(TuningError::invalid(
                "steering.min_assist_speed",
                "must be below max_assist_speed",
            ));
        }
        if s.max_yaw_rate_per_tick < 0.0 || s.yaw_rate_decay_per_tick < 0.0 || s.max_air_pitch < 0.0
        {
            return Err(TuningError::invalid("steering", "limits must not be negative"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_tuning_is_valid() {
        assert!(VehicleConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = VehicleConfig::from_yaml_str(
            "powertrain:\n  max_rpm: 12000\n  rev_limit: Interval\nbody:\n  mass: 75\n",
        )
        .unwrap();
        assert_eq!(config.powertrain.max_rpm, 12000.0);
        assert_eq!(config.powertrain.rev_limit, RevLimitMode::Interval);
        assert_eq!(config.body.mass, 75.0);
        assert_eq!(config.grip, GripConfig::default());
        assert_eq!(config.powertrain.cvt, CvtConfig::default());
    }

    #[test]
    fn short_curve_is_rejected_at_load() {
        let result = VehicleConfig::from_yaml_str("grip:\n  forward_curve: [1, 2, 3]\n");
        assert!(matches!(result, Err(TuningError::Yaml(_))));
    }

    #[test]
    fn inverted_cvt_ratios_are_rejected() {
        let mut config = VehicleConfig::default();
        config.powertrain.cvt.end_gear_ratio = 4.0;
        assert!(matches!(
            config.validate(),
            Err(TuningError::InvalidValue { field: "powertrain.cvt.end_gear_ratio", .. })
        ));
    }

    #[test]
    fn cvt_band_must_sit_below_max_rpm() {
        let mut config = VehicleConfig::default();
        config.powertrain.cvt.max_rpm = config.powertrain.max_rpm;
        assert!(config.validate().is_err());
    }

    #[test]
    fn band_fractions_must_be_ordered() {
        let mut config = VehicleConfig::default();
        config.powertrain.cvt.lower_band_fraction = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn heavy_wheels_are_rejected() {
        let mut config = VehicleConfig::default();
        config.wheels.mass = config.body.mass / 10.0;
        assert!(matches!(
            config.validate(),
            Err(TuningError::InvalidValue { field: "wheels.mass", .. })
        ));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut config = VehicleConfig::default();
        config.suspension.spring_constant = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(TuningError::InvalidValue { field: "suspension.spring_constant", .. })
        ));
    }

    #[test]
    fn max_speed_matches_closed_form() {
        let config = VehicleConfig::default();
        let expected = (PI * 0.7 * 10000.0 * 60.0) / (1000.0 * 0.577 * 4.0);
        assert!((config.max_speed() - expected).abs() < 1e-9);
    }

    #[test]
    fn max_accel_uses_peak_torque_and_start_ratio() {
        let config = VehicleConfig::default();
        let expected = (200.0 * 3.152 * 4.0 / 0.35) / 60.0;
        assert!((config.max_accel() - expected).abs() < 1e-9);
    }

    #[test]
    fn rate_pair_is_fast_then_slow() {
        assert_eq!(SteeringConfig::default().rate_pair(), (6.0, 1.0));
    }
}
