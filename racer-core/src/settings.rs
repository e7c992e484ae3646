use config::{Config, ConfigError, File};
use lazy_static::lazy_static;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub fixed_tick_ms: u64,
    // slow-motion factor applied on top of the fixed step
    pub time_scale: f64,
    pub run_seconds: f64,
    pub vehicle_amount: usize,
    // empty means "use the built-in tuning"
    pub vehicle_tuning_path: String,
    pub telemetry_every_ticks: u64,
}

impl Settings {
    fn new() -> Result<Settings, ConfigError> {
        let config = Config::builder()
            .set_default("fixed_tick_ms", 20)?
            .set_default("time_scale", 1.0)?
            .set_default("run_seconds", 20.0)?
            .set_default("vehicle_amount", 1)?
            .set_default("vehicle_tuning_path", "")?
            .set_default("telemetry_every_ticks", 25)?
            .add_source(File::with_name("config.yaml").required(false))
            .build()?;

        Settings::from_config(config)
    }

    fn from_config(config: Config) -> Result<Settings, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        // a zero step never advances and divides by zero in the tire model
        if settings.fixed_tick_ms == 0 {
            return Err(ConfigError::Message("fixed_tick_ms must be at least 1".into()));
        }
        Ok(settings)
    }

    pub fn fixed_tick_seconds(&self) -> f64 {
        self.fixed_tick_ms as f64 / 1000.0
    }
}

lazy_static! {
    pub static ref GLOBAL_CONFIG: Settings = Settings::new().expect("failed to read config file");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_config_file() {
        let settings = Settings::new().expect("defaults should always deserialize");
        assert!(settings.fixed_tick_ms > 0);
        assert!(settings.time_scale > 0.0);
        assert!(settings.vehicle_amount >= 1);
    }

    #[test]
    fn zero_tick_is_rejected() {
        let config = Config::builder()
            .set_default("fixed_tick_ms", 0)
            .and_then(|builder| builder.set_default("time_scale", 1.0))
            .and_then(|builder| builder.set_default("run_seconds", 1.0))
            .and_then(|builder| builder.set_default("vehicle_amount", 1))
            .and_then(|builder| builder.set_default("vehicle_tuning_path", ""))
            .and_then(|builder| builder.set_default("telemetry_every_ticks", 1))
            .and_then(|builder| builder.build())
            .expect("in-memory config builds");
        assert!(Settings::from_config(config).is_err());
    }

    #[test]
    fn tick_seconds_follow_tick_ms() {
        let mut settings = Settings::new().expect("defaults should always deserialize");
        settings.fixed_tick_ms = 20;
        assert!((settings.fixed_tick_seconds() - 0.02).abs() < 1e-12);
    }
}
