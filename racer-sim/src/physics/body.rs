/* The seam between the vehicle model and whatever rigid-body engine hosts it.
 * The vehicle never integrates position or velocity itself: it reads the
 * body's state, pushes forces and rotation deltas into it, and asks a
 * GroundProbe what lies underneath. PlanarBody and FlatGround are a minimal
 * host for the headless runner and the tests. */

use glam::{DQuat, DVec3};

/// World-space rigid body as seen by the vehicle model. Velocities are m/s.
pub trait RigidBody {
    fn position(&self) -> DVec3;
    fn rotation(&self) -> DQuat;
    fn linear_velocity(&self) -> DVec3;
    fn mass(&self) -> f64;

    fn set_linear_velocity(&mut self, velocity: DVec3);
    fn add_force(&mut self, force: DVec3);
    fn add_force_at_position(&mut self, force: DVec3, position: DVec3);
    // rotate about the body's own axes
    fn rotate_local(&mut self, delta: DQuat);

    fn add_relative_force(&mut self, force: DVec3) {
        let world = self.rotation() * force;
        self.add_force(world);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Surface {
    Standard,
    Ice,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GroundHit {
    pub distance: f64,
    pub point: DVec3,
    pub normal: DVec3,
    pub surface: Surface,
}

pub trait GroundProbe {
    /// Cast from `origin` along `direction` (unit length) up to
    /// `max_distance`. `None` means nothing was hit.
    fn probe(&self, origin: DVec3, direction: DVec3, max_distance: f64) -> Option<GroundHit>;
}

// A body that slides around on a horizontal plane. Vertical forces and
// torques are accumulated (so tests can inspect them) but never integrated.
#[derive(Clone, Debug)]
pub struct PlanarBody {
    pub position: DVec3,
    pub rotation: DQuat,
    pub velocity: DVec3,
    pub mass: f64,

    pub accumulated_force: DVec3,
    pub accumulated_torque: DVec3,
}

impl PlanarBody {
    pub fn new(position: DVec3, mass: f64) -> PlanarBody {
        PlanarBody {
            position,
            rotation: DQuat::IDENTITY,
            velocity: DVec3::ZERO,
            mass,
            accumulated_force: DVec3::ZERO,
            accumulated_torque: DVec3::ZERO,
        }
    }

    pub fn forward(&self) -> DVec3 {
        self.rotation * DVec3::Z
    }

    /* Advance one explicit Euler step using everything pushed in since the
     * last step, then clear the accumulators */
    pub fn integrate(&mut self, time_step: f64) {
        let mut acceleration = self.accumulated_force / self.mass;
        acceleration.y = 0.0;

        self.velocity += acceleration * time_step;
        self.velocity.y = 0.0;
        self.position += self.velocity * time_step;

        self.accumulated_force = DVec3::ZERO;
        self.accumulated_torque = DVec3::ZERO;
    }
}

impl RigidBody for PlanarBody {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn rotation(&self) -> DQuat {
        self.rotation
    }

    fn linear_velocity(&self) -> DVec3 {
        self.velocity
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn set_linear_velocity(&mut self, velocity: DVec3) {
        self.velocity = velocity;
    }

    fn add_force(&mut self, force: DVec3) {
        self.accumulated_force += force;
    }

    fn add_force_at_position(&mut self, force: DVec3, position: DVec3) {
        self.accumulated_force += force;
        self.accumulated_torque += (position - self.position).cross(force);
    }

    fn rotate_local(&mut self, delta: DQuat) {
        self.rotation = (self.rotation * delta).normalize();
    }
}

// Infinite horizontal ground at `height`. `airborne` makes every probe miss.
#[derive(Copy, Clone, Debug)]
pub struct FlatGround {
    pub height: f64,
    pub surface: Surface,
    pub airborne: bool,
}

impl FlatGround {
    pub fn new(height: f64) -> FlatGround {
        FlatGround {
            height,
            surface: Surface::Standard,
            airborne: false,
        }
    }
}

impl GroundProbe for FlatGround {
    fn probe(&self, origin: DVec3, direction: DVec3, max_distance: f64) -> Option<GroundHit> {
        // only rays pointing down can reach the plane
        if self.airborne || direction.y >= 0.0 {
            return None;
        }

        let distance = (origin.y - self.height) / -direction.y;
        if distance < 0.0 || distance > max_distance {
            return None;
        }

        Some(GroundHit {
            distance,
            point: origin + direction * distance,
            normal: DVec3::Y,
            surface: self.surface,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_ground_hits_within_range() {
        let ground = FlatGround::new(0.0);
        let hit = ground
            .probe(DVec3::new(3.0, 1.5, -2.0), -DVec3::Y, 2.0)
            .expect("ground is 1.5 below");
        assert!((hit.distance - 1.5).abs() < 1e-12);
        assert!(hit.point.abs_diff_eq(DVec3::new(3.0, 0.0, -2.0), 1e-12));
        assert_eq!(hit.normal, DVec3::Y);
    }

    #[test]
    fn flat_ground_misses_out_of_range_and_upwards() {
        let ground = FlatGround::new(0.0);
        assert!(ground.probe(DVec3::new(0.0, 3.0, 0.0), -DVec3::Y, 2.0).is_none());
        assert!(ground.probe(DVec3::new(0.0, 1.0, 0.0), DVec3::Y, 2.0).is_none());

        let mut air = FlatGround::new(0.0);
        air.airborne = true;
        assert!(air.probe(DVec3::new(0.0, 1.0, 0.0), -DVec3::Y, 2.0).is_none());
    }

    #[test]
    fn planar_body_ignores_vertical_forces() {
        let mut body = PlanarBody::new(DVec3::new(0.0, 1.0, 0.0), 10.0);
        body.add_force(DVec3::new(10.0, -500.0, 0.0));
        body.integrate(1.0);
        assert!(body.velocity.abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), 1e-12));
        assert!(body.position.abs_diff_eq(DVec3::new(1.0, 1.0, 0.0), 1e-12));
        assert_eq!(body.accumulated_force, DVec3::ZERO);
    }

    #[test]
    fn off_center_force_produces_torque() {
        let mut body = PlanarBody::new(DVec3::ZERO, 10.0);
        body.add_force_at_position(DVec3::Z, DVec3::X);
        assert!(body
            .accumulated_torque
            .abs_diff_eq(DVec3::X.cross(DVec3::Z), 1e-12));
    }

    #[test]
    fn relative_force_follows_rotation() {
        let mut body = PlanarBody::new(DVec3::ZERO, 1.0);
        body.rotate_local(DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2));
        body.add_relative_force(DVec3::Z);
        assert!(body.accumulated_force.abs_diff_eq(DVec3::X, 1e-9));
    }
}
