// Turns a vehicle tuning into the three 0-100 numbers shown on the character
// select screen. Pure bookkeeping on top of the closed-form queries in tuning.

use serde::Serialize;

use crate::curve::CurveTable;
use crate::tuning::VehicleConfig;

const MAX_SPEED_CAP: f64 = 400.0;
const MAX_ACCEL_CAP: f64 = 1000.0;
const HANDLING_CAP: f64 = 30.0;

// Points per steering gain (0..=10). Low-speed steering wants to be quick,
// high-speed steering wants to be calm, and the gap between them small.
const FAST_STABILITY_POINTS: CurveTable =
    CurveTable::builtin([1.0, 3.0, 5.0, 7.0, 9.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0]);
const SLOW_STABILITY_POINTS: CurveTable =
    CurveTable::builtin([6.0, 8.0, 9.0, 10.0, 9.0, 7.0, 5.0, 3.0, 2.0, 1.0, 0.0]);
const DYNAMIC_RANGE_POINTS: CurveTable =
    CurveTable::builtin([8.0, 9.0, 10.0, 9.0, 8.0, 6.0, 4.0, 3.0, 2.0, 1.0, 0.0]);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpecRating {
    pub max_speed: u8,
    pub accel: u8,
    pub handling: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct HandlingScore {
    pub fast_stability: f64,
    pub slow_stability: f64,
    pub dynamic_range: f64,
}

impl HandlingScore {
    pub fn total(&self) -> f64 {
        self.fast_stability * 1.25 + self.slow_stability * 1.25 + self.dynamic_range * 0.5
    }
}

// the point tables span gains 0..=10
fn points(table: &CurveTable, gain: f64) -> f64 {
    table.interpolate((gain / 10.0).clamp(0.0, 1.0))
}

fn to_param(value: f64, cap: f64) -> u8 {
    (value.clamp(0.0, cap) / cap * 100.0) as u8
}

pub fn handling_score(config: &VehicleConfig) -> HandlingScore {
    let (fast, slow) = config.steering.rate_pair();
    HandlingScore {
        fast_stability: points(&FAST_STABILITY_POINTS, fast),
        slow_stability: points(&SLOW_STABILITY_POINTS, slow),
        dynamic_range: points(&DYNAMIC_RANGE_POINTS, (fast - slow).abs()),
    }
}

pub fn rate(config: &VehicleConfig) -> SpecRating {
    SpecRating {
        max_speed: to_param(config.max_speed(), MAX_SPEED_CAP),
        accel: to_param(config.max_accel(), MAX_ACCEL_CAP),
        handling: to_param(handling_score(config).total(), HANDLING_CAP),
    }
}
