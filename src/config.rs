use anyhow::Result;
use config::{Environment, File};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::util;

pub static CONFIG: Lazy<DroneConfig> =
    Lazy::new(|| DroneConfig::load().expect("Failed to load configuration"));

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    pub general: GeneralConfig,
    pub timing: TimingConfig,
    pub flight: FlightConfig,
    pub camera: CameraConfig,
    pub radio: RadioConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
    pub drone_id: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            drone_id: util::get_device_mac(),
        }
    }
}

/// Delays are expressed in time units; `time_unit_ms` sets how long one unit is.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub time_unit_ms: u64,
    pub periodic_check_interval: u64,
    pub terrain_analysis: u64,
    pub landing_hover: u64,
    pub transmit: u64,
    pub charge_step: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            time_unit_ms: 1000,
            periodic_check_interval: 180,
            terrain_analysis: 3,
            landing_hover: 20,
            transmit: 2,
            charge_step: 1,
        }
    }
}

impl TimingConfig {
    pub fn units(&self, count: u64) -> Duration {
        Duration::from_millis(self.time_unit_ms.saturating_mul(count))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub max_height: f32,
    pub default_altitude: f32,
    pub min_battery_level: f32,
    pub critical_battery_level: f32,
    pub solar_charging_rate: f32,
    pub min_temperature: f32,
    pub wind_threshold: f32,
    pub propeller_speed: u32,
    pub lidar_height: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            max_height: 5.0,
            default_altitude: 4.0,
            min_battery_level: 40.0,
            critical_battery_level: 50.0,
            solar_charging_rate: 5.0,
            min_temperature: -20.0,
            wind_threshold: 20.0,
            propeller_speed: 2500,
            lidar_height: 0.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 640,
            height: 480,
            jpeg_quality: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub enabled: bool,
    pub preview_len: usize,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preview_len: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub flight_data_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            flight_data_file: "flight_data.txt".to_string(),
        }
    }
}

impl DroneConfig {
    pub fn load() -> Result<Self> {
        let env = std::env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let config_path = format!("config/{}.toml", env);
        let fallback_path = format!("/etc/mars-drone/{}.toml", env);

        let config_builder = config::Config::builder();
        let config_builder = if Path::new(&config_path).exists() {
            config_builder.add_source(File::with_name(&config_path))
        } else {
            config_builder.add_source(File::with_name(&fallback_path).required(false))
        };

        let settings = config_builder
            .add_source(Environment::with_prefix("MARS_DRONE").separator("__"))
            .build()?;
        let config = settings.try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_flight_rules() {
        let config = DroneConfig::default();
        assert_eq!(config.flight.max_height, 5.0);
        assert_eq!(config.flight.min_battery_level, 40.0);
        assert_eq!(config.flight.critical_battery_level, 50.0);
        assert_eq!(config.timing.periodic_check_interval, 180);
        assert_eq!(config.camera.jpeg_quality, 50);
        assert!(!config.general.drone_id.is_empty());
    }

    #[test]
    fn test_time_units() {
        let timing = TimingConfig {
            time_unit_ms: 250,
            ..Default::default()
        };
        assert_eq!(timing.units(4), Duration::from_secs(1));
        assert_eq!(timing.units(0), Duration::ZERO);
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                "[flight]\nmax_height = 3.5\n\n[storage]\nflight_data_file = \"log.txt\"\n",
                config::FileFormat::Toml,
            ))
            .build()?;
        let config: DroneConfig = settings.try_deserialize()?;

        assert_eq!(config.flight.max_height, 3.5);
        assert_eq!(config.flight.default_altitude, 4.0);
        assert_eq!(config.storage.flight_data_file, "log.txt");
        assert!(config.radio.enabled);
        Ok(())
    }
}
