use glam::DVec3;

use racer_core::tuning::{GripConfig, SuspensionConfig};

use crate::physics::body::{GroundHit, GroundProbe, RigidBody, Surface};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GroundContact {
    pub hit: Option<GroundHit>,
    // measured distance - rest length; positive means the legs are stretched
    pub ride_height_error: f64,
}

impl GroundContact {
    pub fn airborne(config: &SuspensionConfig) -> GroundContact {
        GroundContact {
            hit: None,
            ride_height_error: config.probe_length - config.rest_length,
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.hit.is_some()
    }

    // flat ground when airborne, so projections stay well defined
    pub fn normal(&self) -> DVec3 {
        self.hit.map_or(DVec3::Y, |hit| hit.normal)
    }

    pub fn surface(&self) -> Option<Surface> {
        self.hit.map(|hit| hit.surface)
    }
}

// A hit we can't make sense of counts as no hit at all
fn sanitize(hit: GroundHit, max_distance: f64) -> Option<GroundHit> {
    let usable = hit.distance.is_finite()
        && hit.distance >= 0.0
        && hit.distance <= max_distance
        && hit.point.is_finite()
        && hit.normal.is_finite()
        && hit.normal.length_squared() > 0.0;

    if usable {
        Some(GroundHit {
            normal: hit.normal.normalize(),
            ..hit
        })
    } else {
        None
    }
}

/* Cast straight down (in the body's frame) from the body's origin */
pub fn probe_ground(
    probe: &dyn GroundProbe,
    body: &dyn RigidBody,
    config: &SuspensionConfig,
) -> GroundContact {
    let down = body.rotation() * DVec3::new(0.0, -1.0, 0.0);
    match probe
        .probe(body.position(), down, config.probe_length)
        .and_then(|hit| sanitize(hit, config.probe_length))
    {
        Some(hit) => GroundContact {
            hit: Some(hit),
            ride_height_error: hit.distance - config.rest_length,
        },
        None => GroundContact::airborne(config),
    }
}

// Spring-damper force along the body's up axis. Zero off the ground.
pub fn damping_force(config: &SuspensionConfig, contact: &GroundContact, vertical_velocity: f64) -> f64 {
    if !contact.is_grounded() {
        return 0.0;
    }
    -config.spring_constant * contact.ride_height_error
        + config.damping_coefficient * vertical_velocity
}

pub fn ground_friction(config: &GripConfig, surface: Option<Surface>) -> f64 {
    match surface {
        Some(Surface::Ice) => config.ice_ground_friction,
        Some(Surface::Standard) | None => config.standard_ground_friction,
    }
}

// Where the wheels get drawn: on the ground when there is some, otherwise
// hanging at full probe length under the body
pub fn wheel_anchor(contact: &GroundContact, body: &dyn RigidBody, config: &SuspensionConfig) -> DVec3 {
    match contact.hit {
        Some(hit) => hit.point,
        None => body.position() - (body.rotation() * DVec3::Y) * config.probe_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::{FlatGround, PlanarBody};

    struct BrokenProbe;

    impl GroundProbe for BrokenProbe {
        fn probe(&self, origin: DVec3, _direction: DVec3, _max_distance: f64) -> Option<GroundHit> {
            Some(GroundHit {
                distance: f64::NAN,
                point: origin,
                normal: DVec3::ZERO,
                surface: Surface::Standard,
            })
        }
    }

    #[test]
    fn stretched_legs_pull_down() {
        let config = SuspensionConfig::default();
        let body = PlanarBody::new(DVec3::new(0.0, 1.5, 0.0), 60.0);
        let contact = probe_ground(&FlatGround::new(0.0), &body, &config);
        assert!(contact.is_grounded());
        assert!((contact.ride_height_error - 0.5).abs() < 1e-12);
        assert!((damping_force(&config, &contact, 0.0) + 500.0).abs() < 1e-9);
    }

    #[test]
    fn damping_opposes_vertical_motion() {
        let config = SuspensionConfig::default();
        let body = PlanarBody::new(DVec3::new(0.0, 1.0, 0.0), 60.0);
        let contact = probe_ground(&FlatGround::new(0.0), &body, &config);
        assert!(damping_force(&config, &contact, 2.0) < 0.0);
        assert!(damping_force(&config, &contact, -2.0) > 0.0);
    }

    #[test]
    fn no_ground_means_no_force() {
        let config = SuspensionConfig::default();
        let body = PlanarBody::new(DVec3::new(0.0, 10.0, 0.0), 60.0);
        let contact = probe_ground(&FlatGround::new(0.0), &body, &config);
        assert!(!contact.is_grounded());
        assert_eq!(damping_force(&config, &contact, -5.0), 0.0);
        let anchor = wheel_anchor(&contact, &body, &config);
        assert!(anchor.abs_diff_eq(DVec3::new(0.0, 8.0, 0.0), 1e-12));
    }

    #[test]
    fn garbage_probe_result_is_not_grounded() {
        let config = SuspensionConfig::default();
        let body = PlanarBody::new(DVec3::new(0.0, 1.0, 0.0), 60.0);
        let contact = probe_ground(&BrokenProbe, &body, &config);
        assert!(!contact.is_grounded());
        assert_eq!(contact.normal(), DVec3::Y);
    }

    #[test]
    fn grounded_anchor_sits_on_hit_point() {
        let config = SuspensionConfig::default();
        let body = PlanarBody::new(DVec3::new(2.0, 1.0, 3.0), 60.0);
        let contact = probe_ground(&FlatGround::new(0.0), &body, &config);
        let anchor = wheel_anchor(&contact, &body, &config);
        assert!(anchor.abs_diff_eq(DVec3::new(2.0, 0.0, 3.0), 1e-12));
    }

    #[test]
    fn ice_is_slippery() {
        let grip = GripConfig::default();
        assert_eq!(ground_friction(&grip, Some(Surface::Ice)), grip.ice_ground_friction);
        assert_eq!(ground_friction(&grip, Some(Surface::Standard)), grip.standard_ground_friction);
        assert!(ground_friction(&grip, Some(Surface::Ice)) < ground_friction(&grip, None));
    }
}
