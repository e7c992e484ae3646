pub mod curve;
pub mod error;
pub mod player_inputs;
pub mod rating;
mod settings;
pub mod tuning;

pub use settings::{Settings, GLOBAL_CONFIG};

// Body speeds come out of the rigid body in m/s, but every speed-dependent
// tunable (slip, CVT, steering assist) is expressed in km/h
pub const KMH_PER_MS: f64 = 3.6;

// Tunables that are expressed "per tick" were tuned against this step length
pub const REFERENCE_TICK_SECONDS: f64 = 0.02;

pub type VehicleID = usize;
