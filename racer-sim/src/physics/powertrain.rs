// Engine RPM, rev limiter, CVT ratio and per-wheel torque split

use log::debug;

use racer_core::tuning::{GripConfig, PowertrainConfig, RevLimitMode};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevLimiterState {
    Unlimited,
    // seconds spent with the throttle cut so far
    Limiting { elapsed: f64 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RevLimiter {
    pub state: RevLimiterState,
}

impl Default for RevLimiter {
    fn default() -> Self {
        RevLimiter {
            state: RevLimiterState::Unlimited,
        }
    }
}

impl RevLimiter {
    pub fn is_limiting(&self) -> bool {
        matches!(self.state, RevLimiterState::Limiting { .. })
    }

    pub fn reset(&mut self) {
        self.state = RevLimiterState::Unlimited;
    }

    /// Returns the throttle the engine actually gets this tick.
    pub fn apply(&mut self, config: &PowertrainConfig, rpm: f64, throttle: f64, time_step: f64) -> f64 {
        match config.rev_limit {
            RevLimitMode::None => throttle,
            RevLimitMode::Interval => self.apply_interval(config, rpm, throttle, time_step),
            RevLimitMode::AccelOff => accel_off_throttle(config, rpm, throttle),
        }
    }

    fn apply_interval(
        &mut self,
        config: &PowertrainConfig,
        rpm: f64,
        throttle: f64,
        time_step: f64,
    ) -> f64 {
        // hitting the red zone (re)starts the cut, even mid-cut
        if rpm >= config.red_zone_rpm {
            if !self.is_limiting() {
                debug!("rev limiter engaged at {:.0} rpm", rpm);
            }
            self.state = RevLimiterState::Limiting { elapsed: 0.0 };
            return 0.0;
        }

        match self.state {
            RevLimiterState::Unlimited => throttle,
            RevLimiterState::Limiting { elapsed } => {
                let elapsed = elapsed + time_step;
                if elapsed >= config.limiter_interval_seconds {
                    debug!("rev limiter released after {:.3}s", elapsed);
                    self.state = RevLimiterState::Unlimited;
                    throttle
                } else {
                    self.state = RevLimiterState::Limiting { elapsed };
                    0.0
                }
            }
        }
    }
}

// Throttle ceiling falls linearly from 1 at accel_off_start_rpm to 0 at the
// red zone; there is no state to remember.
pub fn accel_off_throttle(config: &PowertrainConfig, rpm: f64, throttle: f64) -> f64 {
    let ceiling = 1.0
        - (rpm - config.accel_off_start_rpm) / (config.red_zone_rpm - config.accel_off_start_rpm);
    throttle.min(ceiling.clamp(0.0, 1.0))
}

// km/h at the tire/body -> engine RPM through `total_ratio`
pub fn speed_to_rpm(speed_kmh: f64, wheel_circumference: f64, total_ratio: f64) -> f64 {
    speed_kmh * 1000.0 / 60.0 / wheel_circumference * total_ratio
}

/* One tick of engine speed. The engaged share of the clutch slaves the engine
 * to the wheels; the disengaged share lets it free-rev toward the throttle. */
pub fn update_rpm(
    config: &PowertrainConfig,
    rpm: f64,
    slaved_rpm: f64,
    throttle: f64,
    clutch: f64,
    step_scale: f64,
) -> f64 {
    let mut rpm = rpm * (1.0 - clutch) + slaved_rpm * clutch;
    rpm += (config.rpm_rise_per_tick * throttle - config.rpm_fall_per_tick * (1.0 - throttle))
        * (1.0 - clutch)
        * step_scale;
    rpm.clamp(0.0, config.max_rpm)
}

/// Next CVT gear ratio (without the final drive).
///
/// `body_rpm` is what the engine would turn at if the body's actual speed went
/// through the current ratio. Below the throttle-dependent target the ratio
/// climbs toward the start ratio, fastest while the body is well under
/// `target * lower_band_fraction`; past `target * upper_band_fraction` it falls
/// toward the end ratio, faster the closer the body gets to max RPM.
pub fn cvt_ratio_update(
    config: &PowertrainConfig,
    gear_ratio: f64,
    body_rpm: f64,
    throttle: f64,
    step_scale: f64,
) -> f64 {
    let cvt = &config.cvt;
    let target = cvt.min_rpm * (1.0 - throttle) + cvt.max_rpm * throttle;
    let lower = target * cvt.lower_band_fraction;
    let upper = target * cvt.upper_band_fraction;

    let next = if body_rpm < upper {
        let rate = 1.0 - ((body_rpm - lower) / (upper - lower)).clamp(0.0, 1.0);
        (gear_ratio + rate * cvt.ratio_change_per_tick * step_scale).min(cvt.start_gear_ratio)
    } else {
        let rate = ((body_rpm - upper) / (config.max_rpm - upper)).clamp(0.0, 1.0);
        (gear_ratio - rate * cvt.ratio_change_per_tick * step_scale).max(cvt.end_gear_ratio)
    };

    next.clamp(cvt.end_gear_ratio, cvt.start_gear_ratio)
}

/// Share of engine torque per wheel, indexed like `WheelPosition`
/// (front right, front left, rear right, rear left).
pub fn drive_fractions(grip: &GripConfig) -> [f64; 4] {
    let rear = grip.drive_distribution_forward;
    let right = grip.drive_distribution_sideways;
    [
        (1.0 - rear) * right,
        (1.0 - rear) * (1.0 - right),
        rear * right,
        rear * (1.0 - right),
    ]
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct WheelTorque {
    // this wheel's share of the curve torque
    pub drive: f64,
    // engine braking, signed against the direction of travel
    pub resist: f64,
    pub net: f64,
    pub brake: f64,
}

pub fn wheel_torque(
    config: &PowertrainConfig,
    rpm_rate: f64,
    total_ratio: f64,
    wheel_speed: f64,
    drive_fraction: f64,
    throttle: f64,
    brake: f64,
) -> WheelTorque {
    let drive = config.torque_curve.interpolate(rpm_rate.clamp(0.0, 1.0)) * drive_fraction;

    let mut resist = (config.resist_torque * total_ratio).min(wheel_speed.abs() * config.resist_speed_cap);
    // rolling backwards, so engine braking pushes the other way
    if wheel_speed < 0.0 {
        resist = -resist;
    }

    WheelTorque {
        drive,
        resist,
        net: drive * throttle - resist * (1.0 - throttle),
        brake: brake * config.brake_torque,
    }
}
