use racer_core::player_inputs::{ControlInputs, InputProvider};

// A canned drive for the headless runner: full throttle with a gentle weave,
// then standing on the brake
pub struct ScriptedInput {
    elapsed: f64,
    throttle_seconds: f64,
    weave_period: f64,
}

impl ScriptedInput {
    pub fn new(throttle_seconds: f64) -> ScriptedInput {
        ScriptedInput {
            elapsed: 0.0,
            throttle_seconds,
            weave_period: 4.0,
        }
    }

    pub fn is_braking(&self) -> bool {
        self.elapsed >= self.throttle_seconds
    }
}

impl InputProvider for ScriptedInput {
    fn poll(&mut self, time_step: f64) -> ControlInputs {
        let inputs = if self.is_braking() {
            ControlInputs::new(0.0, 0.0, 0.0, 1.0, 1.0)
        } else {
            let phase = self.elapsed / self.weave_period * std::f64::consts::TAU;
            ControlInputs::new(0.2 * phase.sin(), 0.0, 1.0, 0.0, 1.0)
        };
        self.elapsed += time_step;
        inputs
    }
}
