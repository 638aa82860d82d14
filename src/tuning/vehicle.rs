use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Gameplay tuning for the player's car: drive forces, steering rates and
/// the damage/respawn thresholds.
///
/// Keep this separate from runtime/server configuration (ports, log format).
/// All durations are seconds of simulated time; per-tick rates are applied
/// once per fixed 1/60 s step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    /// Drive value applied to each rear wheel while forward is held.
    pub forward_force: f32,

    /// Drive value applied (negated) to each rear wheel while back is held.
    /// Kept below `forward_force`.
    pub reverse_force: f32,

    /// Multiplier on both drive values while a boost is active.
    pub boost_force_multiplier: f32,

    /// Hard limit of the physical front-wheel steering angle (radians).
    pub max_steer_value: f32,

    /// Radians per tick when steering away from center, before speed scaling.
    pub steer_speed: f32,

    /// Radians per tick when returning to center. Faster than `steer_speed`.
    pub return_steer_speed: f32,

    /// Upper bound for damage taken from a single contact.
    pub collision_damage_cap: f32,

    /// Impact speed along the contact normal below which contacts are harmless.
    pub damage_velocity_threshold: f32,

    /// Health regained per second once regeneration kicks in.
    pub health_regen_rate: f32,

    /// Seconds without a collision before regeneration starts.
    pub health_regen_delay: f32,

    /// Seconds without forward progress before an automatic respawn.
    pub respawn_delay: f32,

    /// Seconds of damage immunity after a respawn.
    pub invulnerability_duration: f32,

    pub max_health: f32,

    /// Impact speed to damage conversion factor.
    pub damage_velocity_multiplier: f32,

    /// Planar speed under which the car counts as not moving.
    pub movement_threshold: f32,

    /// Seconds with contact response disabled right after a respawn.
    pub collision_response_delay: f32,

    pub boost_duration: f32,

    /// Lowest steering authority kept at high speed.
    pub min_speed_factor: f32,

    /// Planar speed at which steering authority reaches `min_speed_factor`.
    pub speed_factor_range: f32,

    /// Height added to the checkpoint position when respawning.
    pub respawn_lift: f32,

    // Cosmetic wheel state, per tick.
    pub wheel_roll_speed: f32,
    pub visual_steer_speed: f32,
    pub max_visual_steer: f32,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            forward_force: 10.0,
            reverse_force: 6.0,
            boost_force_multiplier: 3.5,
            max_steer_value: PI / 6.0,
            steer_speed: 0.1,
            return_steer_speed: 0.5,
            collision_damage_cap: 10.0,
            damage_velocity_threshold: 8.0,
            health_regen_rate: 2.0,
            health_regen_delay: 3.0,
            respawn_delay: 10.0,
            invulnerability_duration: 3.0,
            max_health: 100.0,
            damage_velocity_multiplier: 2.0,
            movement_threshold: 0.1,
            collision_response_delay: 0.3,
            boost_duration: 1.0,
            min_speed_factor: 0.3,
            speed_factor_range: 30.0,
            respawn_lift: 1.0,
            wheel_roll_speed: 1.55,
            visual_steer_speed: 0.05,
            max_visual_steer: PI / 4.5,
        }
    }
}

/// Rigid-body layout of the car. Local frame: forward is -X, up is +Y,
/// the wheel axles point along +Z.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisTuning {
    pub half_extents: [f32; 3],
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,

    pub wheel_radius: f32,
    pub wheel_mass: f32,
    pub wheel_angular_damping: f32,
    pub wheel_friction: f32,
    pub wheel_axis: [f32; 3],

    /// Mount points in chassis space: FL, FR, RL, RR.
    pub wheel_offsets: Vec<[f32; 3]>,
}

impl Default for ChassisTuning {
    fn default() -> Self {
        Self {
            half_extents: [2.8, 0.5, 1.45],
            mass: 10.0,
            friction: 0.0,
            restitution: 0.3,
            wheel_radius: 0.5,
            wheel_mass: 0.5,
            wheel_angular_damping: 0.4,
            wheel_friction: 0.9,
            wheel_axis: [0.0, 0.0, 1.0],
            wheel_offsets: vec![
                [-1.9, -0.5, 0.875],
                [-1.9, -0.5, -0.875],
                [1.2, -0.5, 0.875],
                [1.2, -0.5, -0.875],
            ],
        }
    }
}
