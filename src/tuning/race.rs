use serde::{Deserialize, Serialize};

/// Session-level rules: the countdown, pickups, crates and dropped blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceTuning {
    /// Countdown length once the race starts.
    pub race_duration_secs: u32,

    /// Chassis-to-pickup distance that collects a boost.
    pub pickup_radius: f32,

    pub crate_damage: f32,

    /// Minimum seconds between two crate hits that deal damage.
    pub crate_cooldown: f32,

    /// Height above the ground at which triggered blocks appear.
    pub block_drop_height: f32,

    pub gravity: f32,
}

impl Default for RaceTuning {
    fn default() -> Self {
        Self {
            race_duration_secs: 150,
            pickup_radius: 2.0,
            crate_damage: 20.0,
            crate_cooldown: 2.0,
            block_drop_height: 5.0,
            gravity: -9.82,
        }
    }
}
