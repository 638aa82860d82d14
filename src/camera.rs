use crate::tuning::CameraTuning;
use crate::vehicle::ChassisSample;
use rapier3d::na::Vector3;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    #[default]
    ThirdPerson,
    FirstPerson,
    Free,
}

impl CameraMode {
    pub fn next(self) -> Self {
        match self {
            CameraMode::ThirdPerson => CameraMode::FirstPerson,
            CameraMode::FirstPerson => CameraMode::Free,
            CameraMode::Free => CameraMode::ThirdPerson,
        }
    }
}

/// What the renderer should do with its camera this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraOutput {
    Pose {
        position: [f32; 3],
        look_at: [f32; 3],
    },
    /// Free mode: the client's orbit control owns the position and only the
    /// orbit target is supplied.
    Orbit { target: [f32; 3] },
}

fn arr(v: Vector3<f32>) -> [f32; 3] {
    [v.x, v.y, v.z]
}

fn vec3(a: [f32; 3]) -> Vector3<f32> {
    Vector3::new(a[0], a[1], a[2])
}

pub struct CameraController {
    tuning: CameraTuning,
    mode: CameraMode,
    current_lateral_offset: f32,
}

impl CameraController {
    pub fn new(tuning: CameraTuning) -> Self {
        Self {
            tuning,
            mode: CameraMode::default(),
            current_lateral_offset: 0.0,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn lateral_offset(&self) -> f32 {
        self.current_lateral_offset
    }

    pub fn cycle(&mut self) -> CameraMode {
        self.mode = self.mode.next();
        self.mode
    }

    /// One tick: advances the third-person sway, then reports the view.
    pub fn update(&mut self, chassis: &ChassisSample) -> CameraOutput {
        if self.mode == CameraMode::ThirdPerson {
            self.advance_sway(chassis);
        }
        self.view(chassis)
    }

    /// Current view for the chassis without advancing any smoothing.
    pub fn view(&self, chassis: &ChassisSample) -> CameraOutput {
        match self.mode {
            CameraMode::ThirdPerson => self.third_person(chassis),
            CameraMode::FirstPerson => self.first_person(chassis),
            CameraMode::Free => CameraOutput::Orbit {
                target: arr(chassis.position),
            },
        }
    }

    fn advance_sway(&mut self, chassis: &ChassisSample) {
        let t = &self.tuning;

        // sideways slide in the chassis frame drives the sway
        let vz = chassis.local_velocity().z;
        if vz.abs() > t.lateral_velocity_threshold {
            let desired = vz.signum() * (vz.abs() * t.lateral_velocity_gain).min(t.max_lateral_offset);
            self.current_lateral_offset += (desired - self.current_lateral_offset) * t.lateral_speed;
        } else {
            self.current_lateral_offset *= 1.0 - t.centering_speed;
        }
    }

    fn third_person(&self, chassis: &ChassisSample) -> CameraOutput {
        let t = &self.tuning;
        let offset = vec3(t.third_person_offset) + Vector3::new(0.0, 0.0, self.current_lateral_offset);
        let position = chassis.position + chassis.rotation * offset;
        let look_at = chassis.position + chassis.rotation * vec3(t.look_ahead);

        CameraOutput::Pose {
            position: arr(position),
            look_at: arr(look_at),
        }
    }

    fn first_person(&self, chassis: &ChassisSample) -> CameraOutput {
        let position = chassis.position + chassis.rotation * vec3(self.tuning.first_person_offset);
        let direction = chassis.rotation * vec3(self.tuning.first_person_forward);

        CameraOutput::Pose {
            position: arr(position),
            look_at: arr(position + direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::na::UnitQuaternion;
    use std::f32::consts::FRAC_PI_2;

    fn sample(linvel: Vector3<f32>) -> ChassisSample {
        ChassisSample {
            position: Vector3::new(10.0, 1.0, -5.0),
            rotation: UnitQuaternion::identity(),
            linvel,
            angvel: Vector3::zeros(),
        }
    }

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn cycle_wraps_through_all_modes() {
        let mut cam = CameraController::new(CameraTuning::default());

        assert_eq!(cam.cycle(), CameraMode::FirstPerson);
        assert_eq!(cam.cycle(), CameraMode::Free);
        assert_eq!(cam.cycle(), CameraMode::ThirdPerson);
    }

    #[test]
    fn chase_camera_sits_behind_and_above() {
        let mut cam = CameraController::new(CameraTuning::default());

        let CameraOutput::Pose { position, look_at } = cam.update(&sample(Vector3::zeros())) else {
            panic!("third person yields a pose");
        };

        assert!(close(position, [13.7, 3.0, -5.0]));
        assert!(close(look_at, [10.0, 3.0, -5.0]));
    }

    #[test]
    fn chase_offset_follows_yaw() {
        let mut cam = CameraController::new(CameraTuning::default());
        let mut chassis = sample(Vector3::zeros());
        chassis.rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);

        let CameraOutput::Pose { position, .. } = cam.update(&chassis) else {
            panic!("pose");
        };

        // +X rotated a quarter turn about +Y ends up on -Z
        assert!(close(position, [10.0, 3.0, -8.7]));
    }

    #[test]
    fn lateral_sway_is_bounded_and_recentres() {
        let mut cam = CameraController::new(CameraTuning::default());
        let sliding = sample(Vector3::new(0.0, 0.0, 10.0));

        for _ in 0..500 {
            cam.update(&sliding);
            assert!(cam.lateral_offset() <= 0.7 + 1e-6);
        }
        assert!((cam.lateral_offset() - 0.7).abs() < 1e-3);

        let still = sample(Vector3::zeros());
        cam.update(&still);
        assert!((cam.lateral_offset() - 0.7 * 0.95).abs() < 1e-3);
    }

    #[test]
    fn view_does_not_advance_sway() {
        let mut cam = CameraController::new(CameraTuning::default());
        let sliding = sample(Vector3::new(0.0, 0.0, 5.0));
        cam.update(&sliding);
        let offset = cam.lateral_offset();

        let first = cam.view(&sliding);
        let second = cam.view(&sliding);

        assert_eq!(first, second);
        assert_eq!(cam.lateral_offset(), offset);
    }

    #[test]
    fn first_person_looks_along_local_forward() {
        let mut cam = CameraController::new(CameraTuning::default());
        cam.cycle();

        let CameraOutput::Pose { position, look_at } = cam.update(&sample(Vector3::zeros())) else {
            panic!("pose");
        };

        assert!(close(position, [10.0, 2.1, -5.0]));
        assert!(close(look_at, [9.0, 2.1, -5.0]));
    }

    #[test]
    fn free_mode_only_seeds_orbit_target() {
        let mut cam = CameraController::new(CameraTuning::default());
        cam.cycle();
        cam.cycle();

        assert_eq!(
            cam.update(&sample(Vector3::new(0.0, 0.0, 5.0))),
            CameraOutput::Orbit {
                target: [10.0, 1.0, -5.0]
            }
        );
        assert_eq!(cam.lateral_offset(), 0.0);
    }
}
