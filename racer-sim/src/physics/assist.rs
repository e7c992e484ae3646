// Driving aids layered on top of the tire model: pseudo weight transfer,
// downforce, speed-sensitive steering and airborne pitch

use glam::DVec3;

use racer_core::tuning::{BodyConfig, SteeringConfig};

// Feeds a fraction of the body's own acceleration back in as a force, so
// speeding up and braking feel like they shift weight around
pub fn inertial_force(
    velocity: DVec3,
    previous_velocity: DVec3,
    time_step: f64,
    mass: f64,
    config: &BodyConfig,
) -> DVec3 {
    (velocity - previous_velocity) / time_step * mass * config.inertial_force_rate
}

pub fn downforce(config: &BodyConfig) -> DVec3 {
    DVec3::new(0.0, -config.downforce, 0.0)
}

/// Yaw gain for the current speed (km/h): `fast_steer_gain` at or below
/// `min_assist_speed`, `slow_steer_gain` at or above `max_assist_speed`,
/// linear in between.
pub fn steer_gain(config: &SteeringConfig, speed_kmh: f64) -> f64 {
    let ratio = ((speed_kmh.abs() - config.min_assist_speed)
        / (config.max_assist_speed - config.min_assist_speed))
        .clamp(0.0, 1.0);
    config.fast_steer_gain * (1.0 - ratio) + config.slow_steer_gain * ratio
}

// Yaw rate in degrees per reference tick. Steering winds it up, it bleeds back
// to zero on its own every tick.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct YawControl {
    pub rate: f64,
}

impl YawControl {
    /// Returns how far to turn this tick, in degrees (positive turns right).
    pub fn step(&mut self, config: &SteeringConfig, gain: f64, steer: f64, step_scale: f64) -> f64 {
        let max = config.max_yaw_rate_per_tick;
        self.rate = (self.rate + gain * steer * step_scale).clamp(-max, max);

        let delta = self.rate * step_scale;

        let decay = config.yaw_rate_decay_per_tick * step_scale;
        self.rate = if self.rate > 0.0 {
            (self.rate - decay).max(0.0)
        } else {
            (self.rate + decay).min(0.0)
        };

        delta
    }

    pub fn reset(&mut self) {
        self.rate = 0.0;
    }
}

// Pitch (degrees, nose down positive) the body has been tilted by in the air
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AirPitch {
    pub angle: f64,
}

impl AirPitch {
    /// Returns the pitch change to apply this tick. On the ground the body is
    /// levelled in one go.
    pub fn step(&mut self, config: &SteeringConfig, input: f64, time_step: f64, grounded: bool) -> f64 {
        let target = if grounded {
            0.0
        } else {
            (self.angle + config.air_pitch_rate * input * time_step)
                .clamp(-config.max_air_pitch, config.max_air_pitch)
        };

        let delta = target - self.angle;
        self.angle = target;
        delta
    }

    pub fn reset(&mut self) {
        self.angle = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steering_is_quick_when_slow_and_calm_when_fast() {
        let config = SteeringConfig::default();
        assert_eq!(steer_gain(&config, 0.0), config.fast_steer_gain);
        assert_eq!(steer_gain(&config, config.min_assist_speed), config.fast_steer_gain);
        assert_eq!(steer_gain(&config, 500.0), config.slow_steer_gain);

        let mid = (config.min_assist_speed + config.max_assist_speed) / 2.0;
        let expected = (config.fast_steer_gain + config.slow_steer_gain) / 2.0;
        assert!((steer_gain(&config, mid) - expected).abs() < 1e-9);
    }

    #[test]
    fn steer_gain_is_monotone_in_speed() {
        let config = SteeringConfig::default();
        let mut previous = steer_gain(&config, 0.0);
        for speed in 1..200 {
            let gain = steer_gain(&config, speed as f64);
            assert!(gain <= previous);
            previous = gain;
        }
    }

    #[test]
    fn yaw_rate_is_bounded() {
        let config = SteeringConfig::default();
        let mut yaw = YawControl::default();
        for _ in 0..50 {
            let delta = yaw.step(&config, 6.0, 1.0, 1.0);
            assert!(delta <= config.max_yaw_rate_per_tick);
        }
        assert_eq!(yaw.rate, config.max_yaw_rate_per_tick - config.yaw_rate_decay_per_tick);
    }

    #[test]
    fn yaw_rate_decays_to_zero() {
        let config = SteeringConfig::default();
        let mut yaw = YawControl { rate: -4.5 };
        let mut ticks = 0;
        while yaw.rate != 0.0 {
            let delta = yaw.step(&config, 6.0, 0.0, 1.0);
            assert!(delta <= 0.0);
            ticks += 1;
            assert!(ticks < 10);
        }
        assert_eq!(yaw.step(&config, 6.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn air_pitch_is_clamped_and_levelled_on_landing() {
        let config = SteeringConfig::default();
        let mut pitch = AirPitch::default();
        let mut total = 0.0;
        for _ in 0..200 {
            total += pitch.step(&config, 1.0, 0.02, false);
        }
        assert!((pitch.angle - config.max_air_pitch).abs() < 1e-9);
        assert!((total - config.max_air_pitch).abs() < 1e-9);

        let delta = pitch.step(&config, 1.0, 0.02, true);
        assert!((delta + config.max_air_pitch).abs() < 1e-9);
        assert_eq!(pitch.angle, 0.0);
    }

    #[test]
    fn inertial_force_follows_acceleration() {
        let config = BodyConfig::default();
        let force = inertial_force(DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO, 0.02, 60.0, &config);
        assert!(force.abs_diff_eq(DVec3::new(50.0 * 60.0 * config.inertial_force_rate, 0.0, 0.0), 1e-9));
    }

    #[test]
    fn downforce_points_down() {
        let config = BodyConfig::default();
        assert_eq!(downforce(&config), DVec3::new(0.0, -config.downforce, 0.0));
    }
}
