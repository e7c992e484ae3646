use glam::DVec3;

use racer_core::tuning::GripConfig;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WheelPosition {
    FrontRight = 0,
    FrontLeft = 1,
    RearRight = 2,
    RearLeft = 3,
}

impl WheelPosition {
    pub const ALL: [WheelPosition; 4] = [
        WheelPosition::FrontRight,
        WheelPosition::FrontLeft,
        WheelPosition::RearRight,
        WheelPosition::RearLeft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

// Everything the model tracks for one wheel. Velocities are km/h in the
// vehicle's local frame (x right, z forward); `force` is local too.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WheelState {
    pub local_velocity: DVec3,

    pub drive_torque: f64,
    pub net_torque: f64,
    pub resist_torque: f64,
    pub brake_torque: f64,

    pub grip_forward: f64,
    pub grip_sideways: f64,

    // +: wheel faster than body, -: body faster than wheel
    pub slip_ratio: f64,
    pub slip_angle: f64,
    // wheel velocity - body velocity
    pub diff_velocity: DVec3,

    pub force: DVec3,
    // what actually reached the body this tick (world frame, on the ground plane)
    pub applied_force: DVec3,

    pub mass: f64,
}

impl WheelState {
    pub fn new(mass: f64) -> WheelState {
        WheelState {
            local_velocity: DVec3::ZERO,
            drive_torque: 0.0,
            net_torque: 0.0,
            resist_torque: 0.0,
            brake_torque: 0.0,
            grip_forward: 0.0,
            grip_sideways: 0.0,
            slip_ratio: 0.0,
            slip_angle: 0.0,
            diff_velocity: DVec3::ZERO,
            force: DVec3::ZERO,
            applied_force: DVec3::ZERO,
            mass,
        }
    }

    pub fn stop(&mut self) {
        self.local_velocity = DVec3::ZERO;
    }

    // squared horizontal speed; slip works on squares to skip the sqrt
    pub fn speed_squared(&self) -> f64 {
        horizontal_speed_squared(self.local_velocity)
    }
}

pub fn horizontal_speed_squared(velocity: DVec3) -> f64 {
    velocity.x * velocity.x + velocity.z * velocity.z
}

/* Drive torque first, then brake. The brake only ever pulls the wheel toward
 * standing still; it can never spin it up in the other direction. */
pub fn integrate_wheel_speed(
    wheel: &mut WheelState,
    total_ratio: f64,
    lever: f64,
    body_mass: f64,
    time_step: f64,
) {
    let drive_accel = (wheel.net_torque * total_ratio / lever) / body_mass;
    wheel.local_velocity.z += drive_accel * time_step;

    let brake_decel = (wheel.brake_torque * total_ratio / lever) / body_mass * time_step;
    let speed = wheel.local_velocity.z;
    wheel.local_velocity.z = if speed > 0.0 {
        (speed - brake_decel).max(0.0)
    } else {
        (speed + brake_decel).min(0.0)
    };
}

/// Normalized slip in `[-1, 1]`. The denominator never drops below 1 (km/h)²
/// so the ratio doesn't explode while the body is nearly stopped.
pub fn slip_ratio(wheel_speed_sq: f64, body_speed_sq: f64, max_slip: f64, grounded: bool) -> f64 {
    if !grounded {
        return 0.0;
    }
    if wheel_speed_sq == 0.0 && body_speed_sq == 0.0 {
        return 0.0;
    }

    let slip = (wheel_speed_sq - body_speed_sq) / body_speed_sq.max(1.0) / max_slip;
    // NaN from garbage input lands on zero rather than escaping the clamp
    if slip.is_nan() {
        return 0.0;
    }
    slip.clamp(-1.0, 1.0)
}

pub fn update_slip(wheel: &mut WheelState, body_local_velocity: DVec3, max_slip: f64, grounded: bool) {
    wheel.slip_ratio = slip_ratio(
        wheel.speed_squared(),
        horizontal_speed_squared(body_local_velocity),
        max_slip,
        grounded,
    );
    wheel.diff_velocity = wheel.local_velocity - body_local_velocity;
    wheel.slip_angle = wheel.diff_velocity.x.atan2(wheel.diff_velocity.z);
}

// |force| may not exceed what it takes to cancel `diff` in one tick
fn clamp_to_differential(force: f64, diff: f64, limit_per_unit: f64) -> f64 {
    let limit = diff.abs() * limit_per_unit;
    force.clamp(-limit, limit)
}

/// Grip lookup plus force synthesis. `friction` is tire × ground friction.
/// Airborne wheels get their grip coefficients but no force.
pub fn update_grip(
    wheel: &mut WheelState,
    config: &GripConfig,
    friction: f64,
    time_step: f64,
    grounded: bool,
) {
    let rate = wheel.slip_ratio.abs().clamp(0.0, 1.0);
    wheel.grip_forward = config.forward_curve.interpolate(rate);
    wheel.grip_sideways = config.sideways_curve.interpolate(rate);

    if !grounded {
        wheel.force = DVec3::ZERO;
        return;
    }

    let diff = wheel.diff_velocity;
    let accel_forward = diff.z.abs() / time_step;
    let accel_sideways = diff.x.abs() / time_step;

    let forward = accel_forward
        * wheel.grip_forward
        * friction
        * wheel.slip_angle.cos()
        * config.grip_power_rate_forward;
    let sideways = accel_sideways
        * wheel.grip_sideways
        * friction
        * wheel.slip_angle.sin()
        * config.grip_power_rate_sideways;

    let limit_per_unit = wheel.mass / time_step;
    wheel.force = DVec3::new(
        clamp_to_differential(sideways, diff.x, limit_per_unit),
        0.0,
        clamp_to_differential(forward, diff.z, limit_per_unit),
    );
}

// The body pushed back on the wheel: bleed the longitudinal differential so
// wheel and body speeds converge. Never more than the differential itself.
pub fn apply_traction_feedback(wheel: &mut WheelState, time_step: f64) {
    let diff = wheel.diff_velocity.z;
    let decel = (wheel.force.z / wheel.mass).clamp(-diff.abs(), diff.abs());
    wheel.local_velocity.z -= decel * time_step;
}
