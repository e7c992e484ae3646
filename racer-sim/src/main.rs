use std::process;

use glam::DVec3;
use log::{error, info, warn};

use racer_core::rating;
use racer_core::tuning::VehicleConfig;
use racer_core::{VehicleID, GLOBAL_CONFIG};
use racer_sim::physics::body::{FlatGround, PlanarBody};
use racer_sim::physics::vehicle::Vehicle;
use racer_sim::script::ScriptedInput;

// lane spacing between vehicles on the start line, metres
const GRID_SPACING: f64 = 4.0;

struct Entry {
    id: VehicleID,
    vehicle: Vehicle,
    body: PlanarBody,
    script: ScriptedInput,
}

fn load_tuning() -> VehicleConfig {
    if GLOBAL_CONFIG.vehicle_tuning_path.is_empty() {
        return VehicleConfig::default();
    }

    match VehicleConfig::load(&GLOBAL_CONFIG.vehicle_tuning_path) {
        Ok(config) => config,
        Err(e) => {
            error!(
                "couldn't load vehicle tuning from {}: {}",
                GLOBAL_CONFIG.vehicle_tuning_path, e
            );
            process::exit(1);
        }
    }
}

fn spawn(id: VehicleID, config: &VehicleConfig) -> Entry {
    let vehicle = match Vehicle::new(config.clone()) {
        Ok(vehicle) => vehicle,
        Err(e) => {
            error!("vehicle tuning rejected: {}", e);
            process::exit(1);
        }
    };

    let position = DVec3::new(id as f64 * GRID_SPACING, config.suspension.rest_length, 0.0);
    let mut entry = Entry {
        id,
        vehicle,
        body: PlanarBody::new(position, config.body.mass),
        // later grid slots brake a little later
        script: ScriptedInput::new(GLOBAL_CONFIG.run_seconds * 0.6 + id as f64),
    };
    entry.vehicle.set_time_scale(GLOBAL_CONFIG.time_scale);
    entry.vehicle.stop_all(&mut entry.body);
    entry
}

fn main() {
    env_logger::init();

    if GLOBAL_CONFIG.time_scale <= 0.0 {
        warn!("time_scale {} freezes every per-tick rate", GLOBAL_CONFIG.time_scale);
    }

    let config = load_tuning();
    let ratings = rating::rate(&config);
    info!(
        "tuning: max speed {:.1} km/h, max accel {:.1}, rating {:?}",
        config.max_speed(),
        config.max_accel(),
        ratings
    );

    let ground = FlatGround::new(0.0);
    let mut entries: Vec<Entry> = (0..GLOBAL_CONFIG.vehicle_amount)
        .map(|id| spawn(id, &config))
        .collect();

    let time_step = GLOBAL_CONFIG.fixed_tick_seconds();
    let ticks = (GLOBAL_CONFIG.run_seconds / time_step).ceil() as u64;
    let telemetry_every = GLOBAL_CONFIG.telemetry_every_ticks.max(1);
    info!(
        "running {} vehicle(s) for {} ticks of {}s",
        entries.len(),
        ticks,
        time_step
    );

    for tick in 0..ticks {
        for entry in entries.iter_mut() {
            entry.vehicle.pull_input(&mut entry.script, time_step);
            entry.vehicle.fixed_tick(&mut entry.body, &ground, time_step);
            entry.body.integrate(time_step);

            if tick % telemetry_every == 0 {
                match serde_json::to_string(&entry.vehicle.telemetry()) {
                    Ok(line) => println!("{{\"tick\":{},\"vehicle\":{},\"state\":{}}}", tick, entry.id, line),
                    Err(e) => warn!("couldn't serialize telemetry: {}", e),
                }
            }
        }
    }

    for entry in entries.iter() {
        info!(
            "vehicle {} finished at z = {:.1} m, {:.1} km/h",
            entry.id,
            entry.body.position.z,
            entry.vehicle.speed_kmh()
        );
    }
}
