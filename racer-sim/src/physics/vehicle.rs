use glam::{DQuat, DVec3};
use log::{debug, info};
use serde::Serialize;

use racer_core::error::TuningError;
use racer_core::player_inputs::{ControlInputs, InputProvider};
use racer_core::tuning::VehicleConfig;
use racer_core::{KMH_PER_MS, REFERENCE_TICK_SECONDS};

use crate::physics::assist::{self, AirPitch, YawControl};
use crate::physics::body::{GroundProbe, RigidBody};
use crate::physics::powertrain::{self, RevLimiter};
use crate::physics::suspension::{self, GroundContact};
use crate::physics::tire::{self, WheelPosition, WheelState};

// Everything about one vehicle that changes from tick to tick
#[derive(Clone, Debug)]
pub struct VehicleState {
    pub body_mass: f64,
    pub wheels: [WheelState; 4],

    pub rpm: f64,
    pub rpm_rate: f64,
    // CVT ratio, without the final drive
    pub gear_ratio: f64,
    pub rev_limiter: RevLimiter,
    // throttle after the rev limiter had its say
    pub effective_throttle: f64,

    pub contact: GroundContact,
    pub ride_height_error: f64,
    pub damping_force: f64,
    pub wheel_anchor: DVec3,

    pub steer_gain: f64,
    pub yaw: YawControl,
    pub air_pitch: AirPitch,

    // body velocity at the start of the previous tick (m/s, world)
    pub previous_velocity: DVec3,
    // body velocity in the vehicle frame, km/h
    pub body_local_velocity: DVec3,
}

impl VehicleState {
    fn new(config: &VehicleConfig) -> VehicleState {
        VehicleState {
            body_mass: config.body.mass,
            wheels: [WheelState::new(config.wheels.mass); 4],
            rpm: 0.0,
            rpm_rate: 0.0,
            gear_ratio: config.powertrain.cvt.start_gear_ratio,
            rev_limiter: RevLimiter::default(),
            effective_throttle: 0.0,
            contact: GroundContact::airborne(&config.suspension),
            ride_height_error: config.suspension.probe_length - config.suspension.rest_length,
            damping_force: 0.0,
            wheel_anchor: DVec3::ZERO,
            steer_gain: config.steering.fast_steer_gain,
            yaw: YawControl::default(),
            air_pitch: AirPitch::default(),
            previous_velocity: DVec3::ZERO,
            body_local_velocity: DVec3::ZERO,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct TireSmoke {
    pub emission_rate: f64,
    pub start_speed: f64,
}

// A snapshot of the display-facing numbers, one line per telemetry sample
#[derive(Copy, Clone, Debug, Serialize)]
pub struct Telemetry {
    pub speed_kmh: f64,
    pub rpm: f64,
    pub rpm_rate: f64,
    pub gear_ratio: f64,
    pub total_gear_ratio: f64,
    pub throttle: f64,
    pub grounded: bool,
    pub slip_ratios: [f64; 4],
    pub steer_gain: f64,
}

pub struct Vehicle {
    config: VehicleConfig,
    state: VehicleState,
    inputs: ControlInputs,
    stick_angle: f64,
    confused: bool,
    time_scale: f64,
}

impl Vehicle {
    pub fn new(config: VehicleConfig) -> Result<Vehicle, TuningError> {
        config.validate()?;
        let state = VehicleState::new(&config);
        Ok(Vehicle {
            config,
            state,
            inputs: ControlInputs::idle(),
            stick_angle: 0.0,
            confused: false,
            time_scale: 1.0,
        })
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn inputs(&self) -> ControlInputs {
        self.inputs
    }

    pub fn set_time_scale(&mut self, time_scale: f64) {
        self.time_scale = time_scale;
    }

    // while confused, left is right and up is down
    pub fn set_confused(&mut self, confused: bool) {
        self.confused = confused;
    }

    pub fn update_input(&mut self, steer: f64, pitch: f64, throttle: f64, brake: f64, clutch: f64) {
        let raw = ControlInputs::new(steer, pitch, throttle, brake, clutch);
        self.stick_angle = raw.stick_angle_degrees();
        self.inputs = if self.confused {
            raw.inverted_directions()
        } else {
            raw
        };
    }

    pub fn pull_input(&mut self, provider: &mut dyn InputProvider, time_step: f64) {
        let ControlInputs {
            steer,
            pitch,
            throttle,
            brake,
            clutch,
        } = provider.poll(time_step);
        self.update_input(steer, pitch, throttle, brake, clutch);
    }

    /* Advance the whole model by one fixed step. Order matters: the
     * powertrain sets the torques the wheels integrate, the ground probe
     * decides whether the wheels may push, and every wheel finishes its slip
     * and grip before any of them pushes the body. */
    pub fn fixed_tick(&mut self, body: &mut dyn RigidBody, ground: &dyn GroundProbe, time_step: f64) {
        let step_scale = time_step / REFERENCE_TICK_SECONDS * self.time_scale;

        let velocity = body.linear_velocity();
        let rotation = body.rotation();
        self.state.body_mass = body.mass();
        self.state.body_local_velocity = rotation.inverse() * velocity * KMH_PER_MS;

        self.update_powertrain(time_step, step_scale);
        self.state.steer_gain =
            assist::steer_gain(&self.config.steering, self.state.body_local_velocity.length());

        self.update_ground(body, ground, velocity);
        let grounded = self.state.contact.is_grounded();

        // pitch first: a landing tick must be level again before it yaws
        let pitch = self
            .state
            .air_pitch
            .step(&self.config.steering, self.inputs.pitch, time_step, grounded);
        if pitch != 0.0 {
            body.rotate_local(DQuat::from_rotation_x(pitch.to_radians()));
        }

        // yaw only bites with feet on the ground
        if grounded {
            let degrees = self.state.yaw.step(
                &self.config.steering,
                self.state.steer_gain,
                self.inputs.steer,
                step_scale,
            );
            body.rotate_local(DQuat::from_rotation_y(degrees.to_radians()));
        }

        body.add_force(assist::inertial_force(
            velocity,
            self.state.previous_velocity,
            time_step,
            self.state.body_mass,
            &self.config.body,
        ));
        self.state.previous_velocity = velocity;

        // the wheels work in the frame the body has after this tick's turn
        self.state.body_local_velocity = body.rotation().inverse() * velocity * KMH_PER_MS;

        self.update_wheels(time_step, grounded);
        self.apply_wheel_forces(body, time_step, grounded);

        body.add_force(assist::downforce(&self.config.body));
    }

    fn update_powertrain(&mut self, time_step: f64, step_scale: f64) {
        let config = &self.config.powertrain;
        let circumference = self.config.body.wheel_circumference();
        let local = self.state.body_local_velocity;

        let body_rpm = powertrain::speed_to_rpm(
            tire::horizontal_speed_squared(local).sqrt(),
            circumference,
            self.total_gear_ratio(),
        );
        self.state.gear_ratio = powertrain::cvt_ratio_update(
            config,
            self.state.gear_ratio,
            body_rpm,
            self.inputs.throttle,
            step_scale,
        );

        let throttle =
            self.state
                .rev_limiter
                .apply(config, self.state.rpm, self.inputs.throttle, time_step);
        self.state.effective_throttle = throttle;

        let total_ratio = self.total_gear_ratio();
        let fractions = powertrain::drive_fractions(&self.config.grip);
        let driven_speed: f64 = self
            .state
            .wheels
            .iter()
            .zip(fractions.iter())
            .map(|(wheel, fraction)| wheel.local_velocity.z * fraction)
            .sum();
        let slaved_rpm = powertrain::speed_to_rpm(driven_speed, circumference, total_ratio);

        self.state.rpm = powertrain::update_rpm(
            config,
            self.state.rpm,
            slaved_rpm,
            throttle,
            self.inputs.clutch,
            step_scale,
        );
        self.state.rpm_rate = self.state.rpm / config.max_rpm;

        for (wheel, fraction) in self.state.wheels.iter_mut().zip(fractions.iter()) {
            let torque = powertrain::wheel_torque(
                config,
                self.state.rpm_rate,
                total_ratio,
                wheel.local_velocity.z,
                *fraction,
                throttle,
                self.inputs.brake,
            );
            wheel.drive_torque = torque.drive;
            wheel.resist_torque = torque.resist;
            wheel.net_torque = torque.net;
            wheel.brake_torque = torque.brake;
        }
    }

    fn update_ground(&mut self, body: &mut dyn RigidBody, ground: &dyn GroundProbe, velocity: DVec3) {
        let suspension_config = &self.config.suspension;
        let was_grounded = self.state.contact.is_grounded();
        let contact = suspension::probe_ground(ground, &*body, suspension_config);

        if contact.is_grounded() != was_grounded {
            if contact.is_grounded() {
                debug!("landed, ride height error {:.3}", contact.ride_height_error);
            } else {
                debug!("left the ground");
            }
        }

        self.state.damping_force = suspension::damping_force(suspension_config, &contact, velocity.y);
        body.add_relative_force(DVec3::new(0.0, self.state.damping_force, 0.0));

        self.state.wheel_anchor = suspension::wheel_anchor(&contact, &*body, suspension_config);
        self.state.ride_height_error = contact.ride_height_error;
        self.state.contact = contact;
    }

    // first pass: every wheel's speed, slip and grip
    fn update_wheels(&mut self, time_step: f64, grounded: bool) {
        let total_ratio = self.total_gear_ratio();
        let lever = self.config.body.leg_length;
        let friction = self.config.grip.tire_friction
            * suspension::ground_friction(&self.config.grip, self.state.contact.surface());

        for wheel in self.state.wheels.iter_mut() {
            tire::integrate_wheel_speed(wheel, total_ratio, lever, self.state.body_mass, time_step);
            tire::update_slip(
                wheel,
                self.state.body_local_velocity,
                self.config.wheels.max_slip_ratio,
                grounded,
            );
            tire::update_grip(wheel, &self.config.grip, friction, time_step, grounded);
        }
    }

    // second pass: push the body, then let the body push back on each wheel
    fn apply_wheel_forces(&mut self, body: &mut dyn RigidBody, time_step: f64, grounded: bool) {
        let rotation = body.rotation();
        let position = body.position();
        let normal = self.state.contact.normal();

        for (wheel, offset) in self.state.wheels.iter_mut().zip(self.config.wheels.offsets.iter()) {
            if !grounded {
                wheel.applied_force = DVec3::ZERO;
                continue;
            }

            let world = rotation * wheel.force;
            let on_ground = world - normal * world.dot(normal);
            body.add_force_at_position(on_ground, position + rotation * *offset);
            wheel.applied_force = on_ground;

            tire::apply_traction_feedback(wheel, time_step);
        }
    }

    pub fn stop_wheel_velocities(&mut self) {
        for wheel in self.state.wheels.iter_mut() {
            wheel.stop();
        }
    }

    pub fn stop_body_velocity(&mut self, body: &mut dyn RigidBody) {
        body.set_linear_velocity(DVec3::ZERO);
        self.state.previous_velocity = DVec3::ZERO;
        self.state.body_local_velocity = DVec3::ZERO;
    }

    // Race start / respawn: nothing moves and the engine is back at idle
    pub fn stop_all(&mut self, body: &mut dyn RigidBody) {
        self.stop_wheel_velocities();
        self.stop_body_velocity(body);
        self.state.rpm = 0.0;
        self.state.rpm_rate = 0.0;
        self.state.rev_limiter.reset();
        self.state.yaw.reset();
        info!("vehicle stopped");
    }

    pub fn rpm(&self) -> f64 {
        self.state.rpm
    }

    pub fn rpm_rate(&self) -> f64 {
        self.state.rpm_rate
    }

    pub fn gear_ratio(&self) -> f64 {
        self.state.gear_ratio
    }

    pub fn total_gear_ratio(&self) -> f64 {
        self.state.gear_ratio * self.config.powertrain.final_gear_ratio
    }

    pub fn wheel(&self, position: WheelPosition) -> &WheelState {
        &self.state.wheels[position.index()]
    }

    pub fn slip_ratio(&self, position: WheelPosition) -> f64 {
        self.wheel(position).slip_ratio
    }

    pub fn slip_ratios(&self) -> [f64; 4] {
        let w = &self.state.wheels;
        [w[0].slip_ratio, w[1].slip_ratio, w[2].slip_ratio, w[3].slip_ratio]
    }

    pub fn is_grounded(&self) -> bool {
        self.state.contact.is_grounded()
    }

    pub fn speed_kmh(&self) -> f64 {
        self.state.body_local_velocity.length()
    }

    pub fn stick_angle(&self) -> f64 {
        self.stick_angle
    }

    pub fn max_speed(&self) -> f64 {
        self.config.max_speed()
    }

    pub fn max_accel(&self) -> f64 {
        self.config.max_accel()
    }

    /// `(fast, slow)` yaw gains, see [`racer_core::tuning::SteeringConfig`].
    pub fn steering_rates(&self) -> (f64, f64) {
        self.config.steering.rate_pair()
    }

    pub fn tire_smoke(&self) -> TireSmoke {
        if !self.is_grounded() {
            return TireSmoke::default();
        }

        let max_slip = self
            .state
            .wheels
            .iter()
            .map(|wheel| wheel.slip_ratio)
            .fold(f64::NEG_INFINITY, f64::max);
        let local = self.state.body_local_velocity;

        TireSmoke {
            emission_rate: (80.0 * max_slip.abs() - 4.0).max(0.0),
            start_speed: (local.x + local.z) / 100.0,
        }
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            speed_kmh: self.speed_kmh(),
            rpm: self.rpm(),
            rpm_rate: self.rpm_rate(),
            gear_ratio: self.gear_ratio(),
            total_gear_ratio: self.total_gear_ratio(),
            throttle: self.state.effective_throttle,
            grounded: self.is_grounded(),
            slip_ratios: self.slip_ratios(),
            steer_gain: self.state.steer_gain,
        }
    }
}
