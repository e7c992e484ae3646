use serde::{Deserialize, Serialize};

type Axis = f64;

// stick deflection below this doesn't count as pointing anywhere
const STICK_DEADZONE: f64 = 0.1;

// ControlInputs gets handed to the simulation once per tick to inform it about
// what a driver is doing. Ranges: [-1, 1] for steer/pitch, [0, 1] for the
// pedals. Nothing here validates them; out-of-range values go straight through.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlInputs {
    pub steer: Axis,
    pub pitch: Axis,
    pub throttle: Axis,
    pub brake: Axis,
    pub clutch: Axis,
}

impl ControlInputs {
    pub fn new(steer: Axis, pitch: Axis, throttle: Axis, brake: Axis, clutch: Axis) -> Self {
        ControlInputs {
            steer,
            pitch,
            throttle,
            brake,
            clutch,
        }
    }

    // engaged clutch, hands off everything else
    pub fn idle() -> Self {
        ControlInputs {
            clutch: 1.0,
            ..Default::default()
        }
    }

    // Angle of the (steer, pitch) stick in degrees, clockwise from straight up.
    // Zero while the stick sits inside the deadzone.
    pub fn stick_angle_degrees(&self) -> f64 {
        if self.steer.hypot(self.pitch) >= STICK_DEADZONE {
            self.steer.atan2(self.pitch).to_degrees()
        } else {
            0.0
        }
    }

    // the "confusion" status flips both directional axes
    pub fn inverted_directions(self) -> Self {
        ControlInputs {
            steer: -self.steer,
            pitch: -self.pitch,
            ..self
        }
    }
}

/// Anything that can produce a driver's controls for the next tick: a gamepad
/// binding, a network peer, a replay, a script.
pub trait InputProvider {
    fn poll(&mut self, time_step: f64) -> ControlInputs;
}

// Fixed inputs forever; handy for tests and for parking a vehicle
impl InputProvider for ControlInputs {
    fn poll(&mut self, _time_step: f64) -> ControlInputs {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stick_angle_points_clockwise_from_up() {
        assert!((ControlInputs::new(1.0, 0.0, 0.0, 0.0, 0.0).stick_angle_degrees() - 90.0).abs() < 1e-9);
        assert!((ControlInputs::new(0.0, 1.0, 0.0, 0.0, 0.0).stick_angle_degrees()).abs() < 1e-9);
        assert!((ControlInputs::new(-1.0, 0.0, 0.0, 0.0, 0.0).stick_angle_degrees() + 90.0).abs() < 1e-9);
    }

    #[test]
    fn stick_inside_deadzone_has_no_angle() {
        let inputs = ControlInputs::new(0.05, 0.05, 0.0, 0.0, 0.0);
        assert_eq!(inputs.stick_angle_degrees(), 0.0);
    }

    #[test]
    fn inversion_only_touches_directions() {
        let inputs = ControlInputs::new(0.5, -0.25, 0.7, 0.1, 1.0).inverted_directions();
        assert_eq!(inputs, ControlInputs::new(-0.5, 0.25, 0.7, 0.1, 1.0));
    }

    #[test]
    fn fixed_inputs_poll_themselves() {
        let mut provider = ControlInputs::idle();
        assert_eq!(provider.poll(0.02), ControlInputs::idle());
    }
}
