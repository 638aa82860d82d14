pub mod camera;
pub mod race;
pub mod vehicle;

pub use camera::CameraTuning;
pub use race::RaceTuning;
pub use vehicle::{ChassisTuning, VehicleTuning};

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Every gameplay knob in one place. Missing tables or fields in a tuning
/// file fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTuning {
    pub vehicle: VehicleTuning,
    pub chassis: ChassisTuning,
    pub camera: CameraTuning,
    pub race: RaceTuning,
}

impl GameTuning {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning: GameTuning = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.vehicle;

        let positive = [
            ("vehicle.forward_force", v.forward_force),
            ("vehicle.reverse_force", v.reverse_force),
            ("vehicle.boost_force_multiplier", v.boost_force_multiplier),
            ("vehicle.max_steer_value", v.max_steer_value),
            ("vehicle.steer_speed", v.steer_speed),
            ("vehicle.return_steer_speed", v.return_steer_speed),
            ("vehicle.collision_damage_cap", v.collision_damage_cap),
            ("vehicle.max_health", v.max_health),
            ("vehicle.speed_factor_range", v.speed_factor_range),
            ("race.pickup_radius", self.race.pickup_radius),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be > 0, got {value}"
                )));
            }
        }

        let non_negative = [
            ("vehicle.damage_velocity_threshold", v.damage_velocity_threshold),
            ("vehicle.health_regen_rate", v.health_regen_rate),
            ("vehicle.health_regen_delay", v.health_regen_delay),
            ("vehicle.respawn_delay", v.respawn_delay),
            ("vehicle.invulnerability_duration", v.invulnerability_duration),
            ("vehicle.collision_response_delay", v.collision_response_delay),
            ("vehicle.boost_duration", v.boost_duration),
            ("race.crate_damage", self.race.crate_damage),
            ("race.crate_cooldown", self.race.crate_cooldown),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be >= 0, got {value}"
                )));
            }
        }

        if !(v.min_speed_factor > 0.0 && v.min_speed_factor <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "vehicle.min_speed_factor must be in (0, 1], got {}",
                v.min_speed_factor
            )));
        }

        if v.return_steer_speed < v.steer_speed {
            return Err(ConfigError::Validation(format!(
                "vehicle.return_steer_speed ({}) must not be slower than vehicle.steer_speed ({})",
                v.return_steer_speed, v.steer_speed
            )));
        }

        if v.reverse_force >= v.forward_force {
            return Err(ConfigError::Validation(format!(
                "vehicle.reverse_force ({}) must be weaker than vehicle.forward_force ({})",
                v.reverse_force, v.forward_force
            )));
        }

        if self.race.race_duration_secs == 0 {
            return Err(ConfigError::Validation(
                "race.race_duration_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
