use serde::{Deserialize, Serialize};

/// Camera offsets and sway rates. Offsets are in chassis space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Chase position relative to the chassis (behind and above).
    pub third_person_offset: [f32; 3],

    /// Look-at point relative to the chassis.
    pub look_ahead: [f32; 3],

    /// Largest sideways sway of the chase camera.
    pub max_lateral_offset: f32,

    /// Fraction of the remaining gap closed per update while sliding.
    pub lateral_speed: f32,

    /// Fraction of the sway removed per update while not sliding.
    pub centering_speed: f32,

    /// Sideways speed above which the car counts as sliding.
    pub lateral_velocity_threshold: f32,

    /// Sway target per unit of sideways speed.
    pub lateral_velocity_gain: f32,

    pub first_person_offset: [f32; 3],
    pub first_person_forward: [f32; 3],
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            third_person_offset: [3.7, 2.0, 0.0],
            look_ahead: [0.0, 2.0, 0.0],
            max_lateral_offset: 0.7,
            lateral_speed: 0.05,
            centering_speed: 0.05,
            lateral_velocity_threshold: 0.1,
            lateral_velocity_gain: 0.5,
            first_person_offset: [0.0, 1.1, 0.0],
            first_person_forward: [-1.0, 0.0, 0.0],
        }
    }
}
